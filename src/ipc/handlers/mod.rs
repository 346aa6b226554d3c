pub mod controls;
pub mod core;
pub mod forms;
pub mod marks;
pub mod messaging;
pub mod roster;
