// API endpoint handlers

pub mod forward;
