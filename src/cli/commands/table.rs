use anyhow::Context;
use clap::Args;
use serde_json::Value;

use crate::cli::{utils, OutputFormat};
use crate::table::{DataTable, HttpTableSource, SortState, TableController, TableError, DEFAULT_PAGE_SIZE};

#[derive(Args)]
pub struct TableArgs {
    #[arg(help = "Gateway resource, e.g. roles, specializations, patients")]
    pub resource: String,

    #[arg(long, env = "CLINIC_GATEWAY_URL", default_value = "http://localhost:3000", help = "Gateway base URL")]
    pub gateway: String,

    #[arg(long, env = "CLINIC_TOKEN", help = "Session token sent as the session cookie")]
    pub token: String,

    #[arg(long, default_value = "token", help = "Session cookie name")]
    pub cookie: String,

    #[arg(long, help = "Case-insensitive search term")]
    pub search: Option<String>,

    #[arg(long, help = "Column to sort by")]
    pub sort: Option<String>,

    #[arg(long, requires = "sort", help = "Sort descending")]
    pub desc: bool,

    #[arg(long, default_value_t = 1, help = "1-based page number")]
    pub page: usize,

    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE, help = "Rows per page")]
    pub page_size: usize,

    #[arg(long, value_name = "JSON", help = "Create a record before listing")]
    pub create: Option<String>,

    #[arg(long, value_name = "ID", help = "Delete a record before listing")]
    pub delete: Option<String>,
}

/// Search columns and required fields of the resources the management pages use.
struct Profile {
    search: &'static [&'static str],
    required: &'static [&'static str],
}

fn profile(resource: &str) -> Profile {
    match resource {
        "roles" | "specializations" => Profile {
            search: &["name", "description"],
            required: &["name"],
        },
        "patients" => Profile {
            search: &["firstName", "lastName", "phoneNumber", "email"],
            required: &["firstName", "lastName"],
        },
        "appointments" => Profile {
            search: &["patientName", "doctorName", "status"],
            required: &["doctorId", "patientId", "typeId"],
        },
        "visits" => Profile {
            search: &["patientName", "doctorName", "notes"],
            required: &["patientId", "doctorId"],
        },
        "users" => Profile {
            search: &["userName", "email", "roleName"],
            required: &[],
        },
        "doctor-availability" => Profile {
            search: &["doctorName", "dayOfWeek"],
            required: &["doctorId", "dayOfWeek", "startTime", "endTime"],
        },
        // unknown resources search every field
        _ => Profile {
            search: &[],
            required: &[],
        },
    }
}

fn describe(err: TableError) -> anyhow::Error {
    let fields: Option<Vec<String>> = err.field_errors().map(|errors| {
        errors
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(", ")))
            .collect()
    });
    match fields {
        Some(fields) => anyhow::anyhow!("{} ({})", err, fields.join("; ")),
        None => err.into(),
    }
}

pub async fn handle(args: TableArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let resource = args.resource.trim_matches('/').to_string();
    let profile = profile(&resource);

    let source =
        HttpTableSource::new(&args.gateway, &resource, &args.cookie, &args.token).with_required(profile.required);
    let mut table = TableController::new(source, DataTable::new(profile.search.iter().copied(), args.page_size));

    table.refresh().await.map_err(describe)?;

    if let Some(raw) = args.create.as_deref() {
        let record: Value = serde_json::from_str(raw).context("--create expects a JSON object")?;
        table.create(record).await.map_err(describe)?;
        utils::output_success(output_format, &format!("Created {} record", resource), None)?;
    }
    if let Some(id) = args.delete.as_deref() {
        table.delete(id).await.map_err(describe)?;
        utils::output_success(output_format, &format!("Deleted {} record {}", resource, id), None)?;
    }

    if let Some(term) = args.search {
        table.set_search(term);
    }
    if let Some(column) = args.sort.as_deref() {
        table.toggle_sort(column);
        if args.desc {
            table.toggle_sort(column);
        }
    }
    table.set_page(args.page);

    let page = table.view();
    if let SortState::Sorted { column, direction } = &table.query().sort {
        tracing::debug!(%column, ?direction, "sorted view");
    }
    utils::output_page(output_format, &resource, &page)
}
