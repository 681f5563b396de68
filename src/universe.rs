/// Milliseconds-per-word basis for the standard 12-characters-per-word
/// universes (English and most others).
pub const DEFAULT_MULTIPLIER: f64 = 12000.0;

/// WPM multiplier for a universe identifier.
///
/// The multiplier converts a character count and a millisecond duration into
/// words per minute: `wpm = multiplier * chars / ms`. Universes with denser
/// scripts redefine the character-to-word ratio, so they carry a larger
/// basis. Callers with their own universe conventions can skip this map and
/// pass any multiplier straight to the speed engine.
pub fn universe_multiplier(universe: &str) -> f64 {
    match universe {
        "lang_ko" => 24000.0,
        "lang_zh" | "lang_zh-tw" | "new_lang_zh-tw" | "lang_ja" => 60000.0,
        _ => DEFAULT_MULTIPLIER,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_universe() {
        assert_eq!(universe_multiplier("play"), 12000.0);
        assert_eq!(universe_multiplier("dictionary"), 12000.0);
        assert_eq!(universe_multiplier(""), 12000.0);
    }

    #[test]
    fn test_korean_universe() {
        assert_eq!(universe_multiplier("lang_ko"), 24000.0);
    }

    #[test]
    fn test_cjk_universes() {
        for universe in ["lang_zh", "lang_zh-tw", "new_lang_zh-tw", "lang_ja"] {
            assert_eq!(universe_multiplier(universe), 60000.0);
        }
    }
}
