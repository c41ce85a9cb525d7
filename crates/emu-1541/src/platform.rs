/// Board services the real-time loop needs besides GPIO.
///
/// `now_us` is polled in a busy loop; it must be a cheap register read.
pub trait Platform {
    /// Free-running microsecond counter (wraps).
    fn now_us(&mut self) -> u32;

    /// Activity LED on the board itself (separate from the LED pin).
    fn set_act_led(&mut self, on: bool);

    /// Busy-wait.
    fn us_delay(&mut self, us: u32);

    /// Start the head-step sample on the audio DMA.
    fn play_sound_dma(&mut self) {}
}
