/// Operator I/O for interactive flows.
///
/// `None` from either read means end of input.
pub trait Prompter {
    fn read_line(&mut self, prompt: &str) -> Option<String>;

    /// Read without echoing, for passwords.
    fn read_secret(&mut self, prompt: &str) -> Option<String>;

    fn say(&mut self, message: &str);
}
