use crate::error::SurfaceError;

/// Where program output (or a rendered error) ends up. Every call replaces the whole value.
pub trait OutputSurface {
    fn show(&mut self, text: &str) -> Result<(), SurfaceError>;
}

/// The control the user activates to request a run. The bridge disables it while a run is
/// in flight.
pub trait RunTrigger {
    fn set_enabled(&mut self, enabled: bool);
}

impl<S: OutputSurface + ?Sized> OutputSurface for Box<S> {
    fn show(&mut self, text: &str) -> Result<(), SurfaceError> {
        (**self).show(text)
    }
}

impl<T: RunTrigger + ?Sized> RunTrigger for Box<T> {
    fn set_enabled(&mut self, enabled: bool) {
        (**self).set_enabled(enabled)
    }
}
