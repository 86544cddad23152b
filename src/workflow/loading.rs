/// Status lines shown while identification runs. The server sends no
/// progress, so these simply rotate.
pub const LOADING_MESSAGES: [&str; 4] = [
    "Uploading photo...",
    "Analyzing leaves...",
    "Matching species...",
    "Preparing care guide...",
];

/// Cycles through [`LOADING_MESSAGES`], wrapping at the end.
#[derive(Debug, Default)]
pub struct LoadingMessages {
    next: usize,
}

impl Iterator for LoadingMessages {
    type Item = &'static str;

    fn next(&mut self) -> Option<Self::Item> {
        let message = LOADING_MESSAGES[self.next % LOADING_MESSAGES.len()];
        self.next = self.next.wrapping_add(1);
        Some(message)
    }
}
