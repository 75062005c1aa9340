pub mod category;
pub mod news;
pub mod settings;
pub mod template;
