pub mod paths;
pub mod privileges;
pub mod shell;
