//! Data exports
//!
//! All destinations share one envelope ([`model::ExportShared`] /
//! [`wire::ExportShared`]) and one lifecycle. A destination only says how its
//! own `destination` object maps and which defaults it injects; everything
//! else runs through the generic functions here.
//!
//! Write path: model -> [`Transcode::to_wire`] -> shared preparation (query
//! object, Meld filter, format normalization) -> destination preparation.
//!
//! Read path: destination type guard -> shared restoration -> destination
//! restoration -> [`Transcode::from_wire`].

pub mod bigquery;
pub mod gcs;
pub mod measurement;
pub mod snowflake;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{FunnelError, Result};
use crate::funnel::FunnelClient;
use crate::mapping::meld::{self, FilterExpr};
use crate::mapping::model;
use crate::mapping::wire;
use crate::mapping::Transcode;

pub use bigquery::BigQueryExport;
pub use gcs::GcsExport;
pub use measurement::MeasurementExport;
pub use snowflake::SnowflakeExport;

const EXPORTS: &str = "exports";

const HEADERS_SAFENAME: &str = "safename";
const FORMAT_PARQUET: &str = "parquet";
const FORMAT_RAW: &str = "raw";
const CURRENCY_INHERIT: &str = "*";

/// A destination-specific export as written by the user
pub trait ExportResource: Transcode + Clone {
    /// Value of `type` on the export and on its destination object
    const DESTINATION_TYPE: &'static str;
    /// Name used in messages, e.g. "BigQuery"
    const DISPLAY_NAME: &'static str;

    fn shared(&self) -> &model::ExportShared;

    fn shared_mut(&mut self) -> &mut model::ExportShared;

    /// Inject destination defaults into a payload whose shared part is ready
    fn prepare_destination(&self, payload: &mut Self::Wire);

    /// Fill model values that do not come out of the plain field mapping
    fn restore_destination(&mut self, _payload: &Self::Wire) {}

    /// Copy values the API computes back into the model after a write
    fn reconcile(&mut self, _response: &Self::Wire) {}
}

/// An API export payload: destination object plus the shared envelope
pub trait ExportPayload: Serialize + DeserializeOwned {
    fn shared(&self) -> &wire::ExportShared;

    fn shared_mut(&mut self) -> &mut wire::ExportShared;

    fn destination_type(&self) -> &str;
}

fn prepare_shared(shared: &mut wire::ExportShared, destination_type: &str) {
    shared.only_allow_edit_from_api = true;
    shared.export_type = destination_type.to_string();
    shared.query = wire::Query {
        fields: std::mem::take(&mut shared.fields),
        range: std::mem::take(&mut shared.range),
        filter: meld::encode(&shared.filters).map(|expr| expr.to_json()),
    };
    shared.format.headers = HEADERS_SAFENAME.to_string();
    if shared.format.format_type == FORMAT_PARQUET {
        shared.format.format_type = FORMAT_RAW.to_string();
    }
}

fn restore_shared(shared: &mut wire::ExportShared) -> Result<()> {
    shared.fields = std::mem::take(&mut shared.query.fields);
    shared.range = std::mem::take(&mut shared.query.range);
    shared.filters = match shared.query.filter.take() {
        Some(value) => meld::decode(&FilterExpr::from_json(&value)?),
        None => Vec::new(),
    };
    if shared.format.format_type == FORMAT_RAW {
        shared.format.format_type = FORMAT_PARQUET.to_string();
    }
    if shared.currency == CURRENCY_INHERIT {
        shared.currency.clear();
    }
    Ok(())
}

/// Build the payload sent on create and update
pub fn prepare<E>(export: &E) -> Result<E::Wire>
where
    E: ExportResource,
    E::Wire: ExportPayload,
{
    let mut payload = export.to_wire()?;
    prepare_shared(payload.shared_mut(), E::DESTINATION_TYPE);
    export.prepare_destination(&mut payload);
    Ok(payload)
}

/// Turn an API payload back into the declarative model.
///
/// Fails with [`FunnelError::TypeMismatch`] when the export belongs to another
/// destination.
pub fn restore<E>(id: &str, mut payload: E::Wire) -> Result<E>
where
    E: ExportResource,
    E::Wire: ExportPayload,
{
    if payload.destination_type() != E::DESTINATION_TYPE {
        return Err(FunnelError::TypeMismatch {
            id: id.to_string(),
            expected: E::DISPLAY_NAME,
            actual: payload.destination_type().to_string(),
        });
    }

    restore_shared(payload.shared_mut())?;
    let mut export = E::from_wire(&payload)?;
    export.restore_destination(&payload);
    Ok(export)
}

fn workspace_of<E: ExportResource>(export: &E) -> Result<&str> {
    export
        .shared()
        .workspace
        .as_deref()
        .ok_or(FunnelError::MissingAttribute("workspace"))
}

/// Create the export and return the model with the id the API assigned
pub async fn create_export<E>(client: &FunnelClient, export: &E) -> Result<E>
where
    E: ExportResource,
    E::Wire: ExportPayload,
{
    let workspace = workspace_of(export)?;
    let payload = prepare(export)?;

    let response: E::Wire = client
        .create_workspace_entity(workspace, EXPORTS, &payload)
        .await?;

    let mut created = export.clone();
    created.shared_mut().id = Transcode::from_wire(&response.shared().id)?;
    created.reconcile(&response);

    tracing::info!(
        "Created {} export {:?} in workspace {}",
        E::DISPLAY_NAME,
        created.shared().id,
        workspace
    );
    Ok(created)
}

/// Read an export; `None` when it does not exist. The caller's id and
/// workspace are kept on the returned model.
pub async fn read_export<E>(client: &FunnelClient, workspace: &str, id: &str) -> Result<Option<E>>
where
    E: ExportResource,
    E::Wire: ExportPayload,
{
    let response: Option<E::Wire> = client.get_workspace_entity(workspace, EXPORTS, id).await?;
    let Some(payload) = response else {
        return Ok(None);
    };

    let mut export = restore::<E>(id, payload)?;
    let shared = export.shared_mut();
    shared.id = Some(id.to_string());
    shared.workspace = Some(workspace.to_string());
    Ok(Some(export))
}

pub async fn update_export<E>(client: &FunnelClient, export: &E) -> Result<E>
where
    E: ExportResource,
    E::Wire: ExportPayload,
{
    let workspace = workspace_of(export)?;
    let id = export
        .shared()
        .id
        .as_deref()
        .ok_or(FunnelError::MissingAttribute("id"))?;
    let payload = prepare(export)?;

    let response: E::Wire = client
        .update_workspace_entity(workspace, EXPORTS, id, &payload)
        .await?;

    let mut updated = export.clone();
    updated.reconcile(&response);
    Ok(updated)
}

pub async fn delete_export(client: &FunnelClient, workspace: &str, id: &str) -> Result<()> {
    client.delete_workspace_entity(workspace, EXPORTS, id).await
}

/// Split an import id of the form `workspace_id/export_id`
pub fn parse_import_id(import_id: &str) -> Result<(&str, &str)> {
    match import_id.split('/').collect::<Vec<_>>()[..] {
        [workspace, id] if !workspace.is_empty() && !id.is_empty() => Ok((workspace, id)),
        _ => Err(FunnelError::InvalidImportId(import_id.to_string())),
    }
}

/// Adopt an existing export by `workspace_id/export_id`
pub async fn import_export<E>(client: &FunnelClient, import_id: &str) -> Result<E>
where
    E: ExportResource,
    E::Wire: ExportPayload,
{
    let (workspace, id) = parse_import_id(import_id)?;
    read_export(client, workspace, id)
        .await?
        .ok_or(FunnelError::NotFound)
}

// =========================================================================
// Destination-erased exports
// =========================================================================

/// Destination selector for commands that only have an id
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportKind {
    Bigquery,
    Gcs,
    Snowflake,
    Measurement,
}

/// Any export, tagged by `kind` in resource files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AnyExport {
    Bigquery(BigQueryExport),
    Gcs(GcsExport),
    Snowflake(SnowflakeExport),
    Measurement(MeasurementExport),
}

impl AnyExport {
    pub fn kind(&self) -> ExportKind {
        match self {
            AnyExport::Bigquery(_) => ExportKind::Bigquery,
            AnyExport::Gcs(_) => ExportKind::Gcs,
            AnyExport::Snowflake(_) => ExportKind::Snowflake,
            AnyExport::Measurement(_) => ExportKind::Measurement,
        }
    }

    pub fn shared(&self) -> &model::ExportShared {
        match self {
            AnyExport::Bigquery(export) => export.shared(),
            AnyExport::Gcs(export) => export.shared(),
            AnyExport::Snowflake(export) => export.shared(),
            AnyExport::Measurement(export) => export.shared(),
        }
    }

    /// The payload that would be sent, as JSON
    pub fn render(&self) -> Result<serde_json::Value> {
        let value = match self {
            AnyExport::Bigquery(export) => serde_json::to_value(prepare(export)?)?,
            AnyExport::Gcs(export) => serde_json::to_value(prepare(export)?)?,
            AnyExport::Snowflake(export) => serde_json::to_value(prepare(export)?)?,
            AnyExport::Measurement(export) => serde_json::to_value(prepare(export)?)?,
        };
        Ok(value)
    }

    /// Create when no id is set, otherwise update
    pub async fn apply(&self, client: &FunnelClient) -> Result<AnyExport> {
        let create = self.shared().id.is_none();
        Ok(match self {
            AnyExport::Bigquery(export) => AnyExport::Bigquery(apply(client, export, create).await?),
            AnyExport::Gcs(export) => AnyExport::Gcs(apply(client, export, create).await?),
            AnyExport::Snowflake(export) => AnyExport::Snowflake(apply(client, export, create).await?),
            AnyExport::Measurement(export) => {
                AnyExport::Measurement(apply(client, export, create).await?)
            }
        })
    }
}

async fn apply<E>(client: &FunnelClient, export: &E, create: bool) -> Result<E>
where
    E: ExportResource,
    E::Wire: ExportPayload,
{
    if create {
        create_export(client, export).await
    } else {
        update_export(client, export).await
    }
}

impl ExportKind {
    pub async fn read(
        self,
        client: &FunnelClient,
        workspace: &str,
        id: &str,
    ) -> Result<Option<AnyExport>> {
        Ok(match self {
            ExportKind::Bigquery => read_export::<BigQueryExport>(client, workspace, id)
                .await?
                .map(AnyExport::Bigquery),
            ExportKind::Gcs => read_export::<GcsExport>(client, workspace, id)
                .await?
                .map(AnyExport::Gcs),
            ExportKind::Snowflake => read_export::<SnowflakeExport>(client, workspace, id)
                .await?
                .map(AnyExport::Snowflake),
            ExportKind::Measurement => read_export::<MeasurementExport>(client, workspace, id)
                .await?
                .map(AnyExport::Measurement),
        })
    }

    pub async fn import(self, client: &FunnelClient, import_id: &str) -> Result<AnyExport> {
        let (workspace, id) = parse_import_id(import_id)?;
        self.read(client, workspace, id)
            .await?
            .ok_or(FunnelError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn shared_wire() -> wire::ExportShared {
        wire::ExportShared {
            name: "daily".to_string(),
            workspace: "ws-1".to_string(),
            format: wire::ExportFormat {
                format_type: FORMAT_PARQUET.to_string(),
                metrics: "export".to_string(),
                headers: String::new(),
            },
            fields: vec![wire::ExportField {
                id: "cost".to_string(),
                ..Default::default()
            }],
            filters: vec![wire::ExportFilter {
                field_id: "brand".to_string(),
                operation: "eq".to_string(),
                value: "acme".to_string(),
                or: Vec::new(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_prepare_shared_builds_query() {
        let mut shared = shared_wire();
        prepare_shared(&mut shared, "gcs");

        assert!(shared.only_allow_edit_from_api);
        assert_eq!(shared.export_type, "gcs");
        assert_eq!(shared.format.format_type, "raw");
        assert_eq!(shared.format.headers, "safename");
        assert_eq!(shared.query.fields.len(), 1);

        let value = serde_json::to_value(&shared).unwrap();
        assert_eq!(value["query"]["where"], json!({"=and": [{"brand": {"=eq": "acme"}}]}));
        assert!(value.get("fields").is_none());
        assert!(value.get("filters").is_none());
    }

    #[test]
    fn test_prepare_shared_without_filters_omits_where() {
        let mut shared = shared_wire();
        shared.filters.clear();
        prepare_shared(&mut shared, "bigquery");

        let value = serde_json::to_value(&shared).unwrap();
        assert!(value["query"].get("where").is_none());
    }

    #[test]
    fn test_other_formats_pass_through() {
        let mut shared = shared_wire();
        shared.format.format_type = "csv".to_string();
        prepare_shared(&mut shared, "gcs");
        assert_eq!(shared.format.format_type, "csv");

        restore_shared(&mut shared).unwrap();
        assert_eq!(shared.format.format_type, "csv");
    }

    #[test]
    fn test_restore_shared_inverts_prepare() {
        let mut shared = shared_wire();
        prepare_shared(&mut shared, "gcs");
        restore_shared(&mut shared).unwrap();

        assert_eq!(shared.format.format_type, "parquet");
        assert_eq!(shared.fields.len(), 1);
        assert_eq!(shared.filters, shared_wire().filters);
    }

    #[test]
    fn test_inherited_currency_is_dropped() {
        let mut shared = shared_wire();
        shared.currency = "*".to_string();
        restore_shared(&mut shared).unwrap();
        assert!(shared.currency.is_empty());

        let mut shared = shared_wire();
        shared.currency = "SEK".to_string();
        restore_shared(&mut shared).unwrap();
        assert_eq!(shared.currency, "SEK");
    }

    #[test]
    fn test_malformed_filter_is_conversion_error() {
        let mut shared = shared_wire();
        prepare_shared(&mut shared, "gcs");
        shared.query.filter = Some(json!({"=and": [{"brand": {"=eq": 3}}]}));

        let err = restore_shared(&mut shared).unwrap_err();
        assert!(matches!(err, FunnelError::Conversion(_)));
        assert!(err.to_string().contains("must be a string"));
    }

    #[test]
    fn test_parse_import_id() {
        assert_eq!(parse_import_id("ws-1/exp-1").unwrap(), ("ws-1", "exp-1"));
        assert!(matches!(
            parse_import_id("exp-1"),
            Err(FunnelError::InvalidImportId(_))
        ));
        assert!(parse_import_id("a/b/c").is_err());
        assert!(parse_import_id("ws-1/").is_err());
    }

    #[test]
    fn test_resource_file_kind_tag() {
        let yaml = r#"
kind: gcs
name: daily
workspace: ws-1
destination:
  bucket: exports
  path: funnel
  output_id_template: "{date}"
  credentials_ref: cred-1
"#;
        let export: AnyExport = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(export.kind(), ExportKind::Gcs);
        assert_eq!(export.shared().name.as_deref(), Some("daily"));
        assert!(export.shared().id.is_none());
    }
}
