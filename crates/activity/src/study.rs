//! Study modes pair a scheduler with a review controller.
//!
//! Scheduling and reviewing live outside this crate; a study mode only
//! switches its two components on and off together.

/// Something a study mode can switch on and off.
pub trait Component: Send {
    fn name(&self) -> &str;
    fn activate(&mut self) {}
    fn deactivate(&mut self) {}
}

/// Decides which card comes next.
pub trait Scheduler: Component {}

/// Drives one review session on top of a scheduler.
pub trait ReviewController: Component {}

pub struct StudyMode {
    id: u32,
    name: String,
    scheduler: Box<dyn Scheduler>,
    review_controller: Box<dyn ReviewController>,
    active: bool,
}
impl StudyMode {
    pub const SCHEDULED_FORGOTTEN_NEW: u32 = 1;

    pub fn new(
        id: u32,
        name: impl Into<String>,
        scheduler: Box<dyn Scheduler>,
        review_controller: Box<dyn ReviewController>,
    ) -> Self {
        Self { id, name: name.into(), scheduler, review_controller, active: false }
    }

    /// The default mode: scheduled cards first, then forgotten ones, then new ones.
    pub fn scheduled_forgotten_new(scheduler: Box<dyn Scheduler>, review_controller: Box<dyn ReviewController>) -> Self {
        Self::new(Self::SCHEDULED_FORGOTTEN_NEW, "Scheduled -> forgotten -> new", scheduler, review_controller)
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn scheduler(&self) -> &dyn Scheduler {
        self.scheduler.as_ref()
    }

    pub fn review_controller(&self) -> &dyn ReviewController {
        self.review_controller.as_ref()
    }

    /// Activate the scheduler, then the review controller. Does nothing if
    /// the mode is already active.
    pub fn activate(&mut self) {
        if self.active {
            return;
        }
        self.scheduler.activate();
        self.review_controller.activate();
        self.active = true;
        tracing::info!(
            mode = self.name,
            scheduler = self.scheduler.name(),
            review_controller = self.review_controller.name(),
            "Activated study mode"
        );
    }

    /// Deactivate both components, in reverse order of activation.
    pub fn deactivate(&mut self) {
        if !self.active {
            return;
        }
        self.review_controller.deactivate();
        self.scheduler.deactivate();
        self.active = false;
        tracing::info!(mode = self.name, "Deactivated study mode");
    }
}
