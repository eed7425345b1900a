pub mod layout;
pub mod layout_parser;
pub mod timetable;
