/// Splits free-text care instructions into numbered steps on sentence
/// boundaries ("Water weekly. Mist leaves." becomes two steps).
pub fn care_steps(instructions: &str) -> Vec<String> {
    instructions
        .split(". ")
        .map(|step| step.trim().trim_end_matches('.').trim())
        .filter(|step| !step.is_empty())
        .enumerate()
        .map(|(index, step)| format!("{}. {}.", index + 1, step))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_each_sentence() {
        assert_eq!(
            care_steps("Water weekly. Keep in bright, indirect light. Wipe leaves monthly."),
            [
                "1. Water weekly.",
                "2. Keep in bright, indirect light.",
                "3. Wipe leaves monthly."
            ]
        );
    }

    #[test]
    fn blank_text_has_no_steps() {
        assert!(care_steps("").is_empty());
        assert!(care_steps(" . ").is_empty());
    }
}
