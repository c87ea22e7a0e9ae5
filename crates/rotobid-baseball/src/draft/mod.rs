// Draft tracking: roster positions and the live draft session.

pub mod position;
pub mod session;
