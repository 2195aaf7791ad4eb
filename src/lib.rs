pub mod directory;
pub mod fetch;
pub mod geometry;
pub mod logging;
pub mod pipeline;
pub mod routing;
pub mod settings;
pub mod table;
pub mod text;
