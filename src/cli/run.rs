//! The query pipeline: filter, update, render

use std::io::{self, Read, Write};

use miette::{bail, IntoDiagnostic, Result};
use tracing::{debug, info, instrument};

use crate::cli::args::Cli;
use crate::cli::fields::write_field_table;
use crate::cli::filters::parse_filters;
use crate::cli::helpers::{ensure_newline, unescape_separator};
use crate::cli::output::{parse_field_list, write_delimited};
use crate::cli::prompt::{Prompt, TerminalPrompt};
use crate::cli::updates::{parse_updates, preview};
use crate::core::{Config, Project};
use crate::orm::{check_attr_path, objects_context, QuerySet, Tables};
use crate::schema::{ModelRegistry, Template, TemplateLoader, TemplateRenderer, TeraRenderer};
use crate::store::DataStore;

/// Everything the pipeline talks to besides its arguments
pub struct Session<'a> {
    pub registry: &'a dyn ModelRegistry,
    pub store: &'a mut dyn DataStore,
    pub renderer: &'a dyn TemplateRenderer,
    pub loader: &'a TemplateLoader,
    pub prompt: &'a mut dyn Prompt,
    pub stdin: &'a mut dyn Read,
    pub out: &'a mut dyn Write,
    pub config: Config,
}

/// Fail early on options that make the invocation meaningless
pub fn check_required(cli: &Cli) -> Result<()> {
    if cli.application.is_none() {
        bail!("You must specify which application to use");
    }
    if cli.model.is_none() {
        bail!("You must specify which model to use");
    }
    if !cli.has_action() {
        bail!("You must specify a list of fields, a template or a set of updates");
    }
    if cli.template_file.as_deref() == Some("-") && !cli.updates.is_empty() && !cli.yes {
        bail!(
            help = "stdin can hold the template or the confirmation, not both",
            "Reading the template from stdin together with updates needs --yes"
        );
    }
    Ok(())
}

/// Run one invocation against the project found from the working directory
pub fn run(cli: &Cli) -> Result<()> {
    check_required(cli)?;

    let project = match &cli.project {
        Some(root) => Project::open(root)?,
        None => Project::discover()?,
    };
    info!(root = %project.root().display(), "using project");

    let config = Config::load(Some(&project.settings().config));
    let schema = project.load_schema()?;
    let mut store = project.store();
    let loader = TemplateLoader::new(project.template_dirs());

    let mut renderer = TeraRenderer::new().with_partials(loader.partials());
    if let (Some(app), Some(model)) = (&cli.application, &cli.model) {
        renderer = renderer.with_model(format!("{}.{}", app, model));
    }

    let mut prompt = TerminalPrompt;
    let mut stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let mut session = Session {
        registry: &schema,
        store: &mut store,
        renderer: &renderer,
        loader: &loader,
        prompt: &mut prompt,
        stdin: &mut stdin,
        out: &mut out,
        config,
    };
    execute(cli, &mut session)
}

/// The pipeline proper, against whatever the session provides
#[instrument(skip_all, fields(app = ?cli.application, model = ?cli.model))]
pub fn execute(cli: &Cli, session: &mut Session) -> Result<()> {
    check_required(cli)?;
    let (Some(app), Some(model_name)) = (&cli.application, &cli.model) else {
        return Ok(());
    };

    let registry = session.registry;
    let model = registry.model(app, model_name)?;

    if cli.list_fields {
        return write_field_table(&mut *session.out, registry, model);
    }

    let predicates = parse_filters(&cli.filters)?;
    let mut queryset = QuerySet::new(registry, model).filter(&predicates)?.distinct();
    if let Some(order) = &cli.order {
        let keys: Vec<&str> = order.split(',').map(str::trim).collect();
        queryset = queryset.order_by(&keys)?;
    }

    // Resolve the output before touching any data
    let fields = cli.fields.as_deref().map(parse_field_list);
    if let Some(fields) = &fields {
        for field in fields {
            check_attr_path(registry, model, field)?;
        }
    }
    let template = match (&cli.template, &cli.template_file) {
        (Some(source), _) => Some(Template::inline(source.as_str())),
        (None, Some(spec)) => Some(session.loader.load(spec, &mut *session.stdin)?),
        (None, None) => None,
    };
    if let Some(template) = &template {
        session.renderer.check(template)?;
    }

    if !cli.updates.is_empty() {
        apply_updates(cli, session, &queryset)?;
    }

    let separator = match &cli.separator {
        Some(sep) => unescape_separator(sep),
        None => session.config.separator.clone(),
    };

    let store: &dyn DataStore = &*session.store;
    let records = queryset.evaluate(store)?;
    info!(count = records.len(), "query matched");
    let tables = Tables::new(registry, store);

    if let Some(template) = template {
        let objects = objects_context(
            &tables,
            model,
            &records,
            session.config.template_depth,
            &session.config.null_text,
        )?;
        debug!(template = %template.name, "rendering");
        let rendered = session.renderer.render(&template, &objects)?;
        session
            .out
            .write_all(ensure_newline(rendered).as_bytes())
            .into_diagnostic()?;
    } else if let Some(fields) = fields {
        write_delimited(
            &mut *session.out,
            &tables,
            model,
            &records,
            &fields,
            &separator,
            &session.config.null_text,
        )?;
    }

    session.out.flush().into_diagnostic()?;
    Ok(())
}

fn apply_updates(cli: &Cli, session: &mut Session, queryset: &QuerySet) -> Result<()> {
    let model = queryset.model();
    let updates = parse_updates(&cli.updates)?;

    let (records, changes) = {
        let store: &dyn DataStore = &*session.store;
        let tables = Tables::new(session.registry, store);
        let changes = updates.validate(&tables, model)?;
        let records = queryset.evaluate(store)?;

        if !records.is_empty() {
            preview(
                &mut *session.out,
                &tables,
                model,
                &records,
                &updates,
                &session.config.null_text,
            )?;
        }
        (records, changes)
    };

    if records.is_empty() {
        writeln!(session.out, "No matching records, nothing to update").into_diagnostic()?;
        return Ok(());
    }

    session.out.flush().into_diagnostic()?;
    let confirmed = cli.yes || session.prompt.confirm("Apply changes?").into_diagnostic()?;
    if !confirmed {
        writeln!(session.out, "Aborted").into_diagnostic()?;
        return Ok(());
    }

    let updated = queryset.update(&mut *session.store, &changes)?;
    info!(updated, "applied updates");
    let noun = if updated == 1 { "record" } else { "records" };
    writeln!(session.out, "Applied! {} {} updated", updated, noun).into_diagnostic()?;
    Ok(())
}
