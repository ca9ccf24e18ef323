use clap::ValueEnum;

use relay_agent::ToolChoice;
use relay_gateway::SlackAckMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliSlackAckMode {
    Inline,
    Background,
}

impl From<CliSlackAckMode> for SlackAckMode {
    fn from(value: CliSlackAckMode) -> Self {
        match value {
            CliSlackAckMode::Inline => SlackAckMode::Inline,
            CliSlackAckMode::Background => SlackAckMode::Background,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliToolChoice {
    Auto,
    Required,
    None,
}

impl From<CliToolChoice> for ToolChoice {
    fn from(value: CliToolChoice) -> Self {
        match value {
            CliToolChoice::Auto => ToolChoice::Auto,
            CliToolChoice::Required => ToolChoice::Required,
            CliToolChoice::None => ToolChoice::None,
        }
    }
}
