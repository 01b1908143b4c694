//! Tool abstractions and the travel planning tool set

pub mod browser;
pub mod budget;
pub mod calendar;
pub mod email;
pub mod registry;
pub mod search;
pub mod tool;
pub mod weather;

pub use browser::{BrowserInfrastructure, BrowserTool};
pub use budget::BudgetCalculator;
pub use calendar::CalendarInviteTool;
pub use email::SendEmailTool;
pub use registry::{DefaultToolRegistry, OpenSourceToolRegistry};
pub use search::WebSearchTool;
pub use tool::{Tool, ToolRegistry, ToolSource};
pub use weather::WeatherTool;
