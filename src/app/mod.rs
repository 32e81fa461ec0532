pub mod ticket_store;

pub use ticket_store::{Submission, TicketStore};
