pub mod booking;
pub mod lifecycle;
pub mod schedule;
pub mod store;
pub mod supabase_store;

pub use booking::AppointmentBookingService;
pub use lifecycle::AppointmentLifecycleService;
pub use schedule::ScheduleAggregator;
pub use store::{AppointmentStore, InMemoryAppointmentStore, StoreError};
pub use supabase_store::SupabaseAppointmentStore;
