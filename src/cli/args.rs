//! Command-line arguments

use clap::{ArgAction, Parser};
use clap_complete::Shell;
use std::path::PathBuf;

const LONG_ABOUT: &str = "\
The data model is queried with the filters given on the command line.
Records are separated with newlines, fields with the separator (a comma by
default). Alternatively a template receives the result of the query as the
`objects` variable.

Filters are key=value pairs. Prefix the key with '!' or '~' to negate it.
Keys follow relations with '__' and may end in a lookup such as
__startswith, __contains, __gt or __isnull. For __in, give a comma separated
list of values.

Examples:
  Name and asset tag of all mc01 servers
    cliquery -a servers -m Server name__startswith=mc01 -f name,assettag
  Name, ip and mac of interfaces whose ip does not contain .82.
    cliquery -a servers -m Interface '!ip_address__contains=.82.' -f server.name,ip_address,mac_address
  Roles of the server with a given mac address
    cliquery -a servers -m Server interface__mac_address=00:17:A4:8D:E6:BC \\
      -t '{{ objects.0.role_set | map(attribute=\"name\") | join(sep=\",\") }}'
  All eth0/eth1 interfaces
    cliquery -a servers -m Interface name__in=eth0,eth1 -f ip_address,mac_address
  Retire every spare server, after confirmation
    cliquery -a servers -m Server status=spare -u status=retired";

/// Query, update and render model records from the command line
#[derive(Parser, Debug, Default)]
#[command(name = "cliquery", author, version, about, long_about = LONG_ABOUT)]
pub struct Cli {
    /// Use this application
    #[arg(short = 'a', long, env = "CLIQUERY_APP", value_name = "APP")]
    pub application: Option<String>,

    /// Query this model
    #[arg(short = 'm', long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Comma separated fields to print; dots follow relations (server.name)
    #[arg(
        short = 'f',
        long,
        value_name = "FIELDS",
        conflicts_with_all = ["template", "template_file"]
    )]
    pub fields: Option<String>,

    /// Order by this field; prefix with '-' for descending
    #[arg(short = 'o', long, value_name = "FIELD", allow_hyphen_values = true)]
    pub order: Option<String>,

    /// Output separator between fields
    #[arg(short = 's', long, value_name = "SEP", allow_hyphen_values = true)]
    pub separator: Option<String>,

    /// Template text, rendered with the result bound to `objects`
    #[arg(short = 't', long, value_name = "TEXT", conflicts_with = "template_file")]
    pub template: Option<String>,

    /// Template file: a path, '-' for stdin, or a name on the template path
    #[arg(short = 'T', long, value_name = "PATH")]
    pub template_file: Option<String>,

    /// Update to apply to every matching record (repeatable)
    #[arg(short = 'u', long = "update", value_name = "FIELD=VALUE", action = ArgAction::Append)]
    pub updates: Vec<String>,

    /// List the fields of the model and exit
    #[arg(short = 'l', long)]
    pub list_fields: bool,

    /// Apply updates without asking for confirmation
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Project root (default: search upwards from the current directory)
    #[arg(short = 'p', long, env = "CLIQUERY_PROJECT", value_name = "DIR")]
    pub project: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short = 'v', long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Print shell completions and exit
    #[arg(long, value_name = "SHELL")]
    pub completions: Option<Shell>,

    /// Filters, key=value
    #[arg(value_name = "FILTER")]
    pub filters: Vec<String>,
}

impl Cli {
    /// Whether any output or update was asked for
    pub fn has_action(&self) -> bool {
        self.fields.is_some()
            || self.template.is_some()
            || self.template_file.is_some()
            || !self.updates.is_empty()
            || self.list_fields
    }

    pub fn wants_template(&self) -> bool {
        self.template.is_some() || self.template_file.is_some()
    }
}
