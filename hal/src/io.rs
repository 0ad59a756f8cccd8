/// Indicator LED shared between the audio task and the button interrupt,
/// hence `&self`. Implementations must not block.
pub trait Led {
    fn set(&self, on: bool);
    fn is_on(&self) -> bool;

    fn toggle(&self) {
        self.set(!self.is_on())
    }
}
