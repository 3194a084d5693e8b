use clap::{Parser, Subcommand};

use std::path::PathBuf;

use crate::data::PropertyFormat;

use super::constants::{
    DEFAULT_SPACE_ID, ENV_CONFIG, ENV_MAX_BODY_BYTES, ENV_MAX_CONDITIONS, ENV_MAX_DEPTH,
};

#[derive(Parser)]
#[command(name = "dvfilter")]
#[command(version, about = "Compile data view filters into backend filter trees", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Maximum JSON filter body size in bytes
    #[arg(long, global = true, env = ENV_MAX_BODY_BYTES)]
    pub max_body_bytes: Option<usize>,

    /// Maximum nesting depth of a JSON filter expression
    #[arg(long, global = true, env = ENV_MAX_DEPTH)]
    pub max_depth: Option<usize>,

    /// Maximum number of filter conditions per request
    #[arg(long, global = true, env = ENV_MAX_CONDITIONS)]
    pub max_conditions: Option<usize>,
}

/// Parse property format from CLI string
fn parse_property_format(s: &str) -> Result<PropertyFormat, String> {
    s.to_lowercase().parse::<PropertyFormat>().map_err(|_| {
        let valid: Vec<&str> = PropertyFormat::ALL.iter().map(|f| f.as_str()).collect();
        format!(
            "Invalid property format '{}'. Valid options: {}",
            s,
            valid.join(", ")
        )
    })
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Compile a URL query string and print the emitted filters
    Query {
        /// Raw query string, e.g. "name=test&age[gt]=25"
        query: String,

        /// Properties fixture (JSON)
        #[arg(long, short = 'p')]
        properties: PathBuf,

        /// Space whose properties are used
        #[arg(long, default_value = DEFAULT_SPACE_ID)]
        space: String,

        /// Endpoint whose default conditions apply to bare keys
        #[arg(long)]
        endpoint: Option<String>,
    },
    /// Compile a JSON filter expression and print the emitted tree
    Expression {
        /// Body file, or "-" for standard input
        body: String,

        /// Properties fixture (JSON)
        #[arg(long, short = 'p')]
        properties: PathBuf,

        /// Space whose properties are used
        #[arg(long, default_value = DEFAULT_SPACE_ID)]
        space: String,
    },
    /// List public filter conditions
    Conditions {
        /// Only list conditions legal for this property format
        #[arg(long, value_parser = parse_property_format)]
        format: Option<PropertyFormat>,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub config: Option<PathBuf>,
    pub max_body_bytes: Option<usize>,
    pub max_depth: Option<usize>,
    pub max_conditions: Option<usize>,
}

impl From<Cli> for (CliConfig, Commands) {
    fn from(cli: Cli) -> Self {
        let config = CliConfig {
            config: cli.config,
            max_body_bytes: cli.max_body_bytes,
            max_depth: cli.max_depth,
            max_conditions: cli.max_conditions,
        };
        (config, cli.command)
    }
}

/// Parse CLI arguments and return config and command
pub fn parse() -> (CliConfig, Commands) {
    Cli::parse().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse_args(args: &[&str]) -> (CliConfig, Commands) {
        Cli::try_parse_from(args).unwrap().into()
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_query_command() {
        let (config, command) = parse_args(&[
            "dvfilter",
            "query",
            "name=test",
            "--properties",
            "props.json",
            "--endpoint",
            "spaces",
            "--max-conditions",
            "5",
        ]);
        assert_eq!(config.max_conditions, Some(5));
        assert!(config.config.is_none());
        match command {
            Commands::Query {
                query,
                properties,
                space,
                endpoint,
            } => {
                assert_eq!(query, "name=test");
                assert_eq!(properties, PathBuf::from("props.json"));
                assert_eq!(space, DEFAULT_SPACE_ID);
                assert_eq!(endpoint.as_deref(), Some("spaces"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_expression_from_stdin() {
        let (_, command) = parse_args(&["dvfilter", "expression", "-", "-p", "props.json"]);
        assert!(matches!(command, Commands::Expression { body, .. } if body == "-"));
    }

    #[test]
    fn test_conditions_format() {
        let (_, command) = parse_args(&["dvfilter", "conditions", "--format", "Multi_Select"]);
        assert!(matches!(
            command,
            Commands::Conditions {
                format: Some(PropertyFormat::MultiSelect)
            }
        ));

        assert!(Cli::try_parse_from(["dvfilter", "conditions", "--format", "blob"]).is_err());
    }
}
