//! Integration tests for the Funnel client using wiremock
//!
//! These tests drive the real client and resource operations against mocked
//! endpoints, covering token acquisition, status-code mapping and the exact
//! payloads sent to the API.

use funnelctl::funnel::auth::fetch_access_token;
use funnelctl::funnel::{AccessToken, FunnelClient};
use funnelctl::mapping::model;
use funnelctl::resource::export::{self, BigQueryExport, GcsExport, MeasurementExport};
use funnelctl::resource::{data_source, export_field, workspace};
use funnelctl::FunnelError;
use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{bearer_token, body_json, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SUBSCRIPTION: &str = "fs123";

fn client_for(server: &MockServer) -> FunnelClient {
    FunnelClient::with_token(
        &format!("{}/v1", server.uri()),
        SUBSCRIPTION,
        AccessToken::new("test-token"),
    )
    .expect("client should build")
}

fn gcs_export() -> GcsExport {
    GcsExport {
        destination: export::gcs::GcsDestination {
            output_id_template: Some("{date}".to_string()),
            path: Some("funnel".to_string()),
            bucket: Some("acme-exports".to_string()),
            gzip: Some(false),
            credentials_ref: Some("cred-1".to_string()),
        },
        shared: model::ExportShared {
            name: Some("daily".to_string()),
            workspace: Some("ws-1".to_string()),
            schedule: Some("0 6 * * *".to_string()),
            format: model::ExportFormat {
                format_type: Some("parquet".to_string()),
                metrics: Some("export".to_string()),
            },
            fields: vec![model::ExportField {
                id: Some("cost".to_string()),
                export_name: Some("Cost".to_string()),
                ..Default::default()
            }],
            filters: vec![model::ExportFilter {
                field_id: Some("brand".to_string()),
                operation: Some("eq".to_string()),
                value: Some("acme".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        },
    }
}

/// Token endpoint tests
mod auth_tests {
    use super::*;

    /// Test client credentials are posted and the access token returned
    #[tokio::test]
    async fn test_token_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .and(body_json(json!({
                "client_id": "id",
                "client_secret": "secret",
                "audience": "https://controlplane.setup.us.funnel.io",
                "grant_type": "client_credentials"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "abc",
                "token_type": "Bearer",
                "expires_in": 86400
            })))
            .expect(1)
            .mount(&server)
            .await;

        let token = fetch_access_token(
            &reqwest::Client::new(),
            &format!("{}/oauth/token", server.uri()),
            "https://controlplane.setup.us.funnel.io",
            "id",
            "secret",
        )
        .await;

        assert_eq!(assert_ok!(token).as_str(), "abc");
    }

    /// Test a rejected grant is an auth error carrying the status
    #[tokio::test]
    async fn test_token_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"error": "access_denied"})),
            )
            .mount(&server)
            .await;

        let result = fetch_access_token(
            &reqwest::Client::new(),
            &format!("{}/oauth/token", server.uri()),
            "aud",
            "id",
            "wrong",
        )
        .await;

        match assert_err!(result) {
            FunnelError::Auth { status, .. } => assert_eq!(status, Some(401)),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    /// Test a 200 with an unreadable body is still an auth error
    #[tokio::test]
    async fn test_token_malformed_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let result = fetch_access_token(
            &reqwest::Client::new(),
            &format!("{}/oauth/token", server.uri()),
            "aud",
            "id",
            "secret",
        )
        .await;

        assert!(matches!(assert_err!(result), FunnelError::Auth { .. }));
    }
}

/// Status-code mapping through the entity client
mod status_tests {
    use super::*;

    /// Test 404 on read means the entity is gone
    #[tokio::test]
    async fn test_read_404_is_none() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/subscriptions/fs123/workspaces/ws-1/exports/exp-1"))
            .and(bearer_token("test-token"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let found = export::read_export::<GcsExport>(&client_for(&server), "ws-1", "exp-1").await;
        assert!(assert_ok!(found).is_none());
    }

    /// Test 404 on delete is not an error
    #[tokio::test]
    async fn test_delete_404_is_ok() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/v1/subscriptions/fs123/workspaces/ws-1/exports/exp-1"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        assert_ok!(export::delete_export(&client_for(&server), "ws-1", "exp-1").await);
    }

    /// Test 404 on update is an error
    #[tokio::test]
    async fn test_update_404_is_error() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/v1/subscriptions/fs123/workspaces/ws-1/exports/exp-1"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let mut existing = gcs_export();
        existing.shared.id = Some("exp-1".to_string());

        let err = assert_err!(export::update_export(&client_for(&server), &existing).await);
        assert!(err.is_not_found());
    }

    /// Test 409 on create is a conflict carrying the details
    #[tokio::test]
    async fn test_create_409_is_conflict() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/subscriptions/fs123/workspaces/ws-1/exports"))
            .respond_with(
                ResponseTemplate::new(409).set_body_json(json!({"existingExportId": "exp-9"})),
            )
            .mount(&server)
            .await;

        let err = assert_err!(export::create_export(&client_for(&server), &gcs_export()).await);
        assert_eq!(err.status_code(), Some(409));
        assert_eq!(err.details(), Some(&json!({"existingExportId": "exp-9"})));
    }

    /// Test 400 surfaces the remote message verbatim
    #[tokio::test]
    async fn test_400_uses_error_message() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/subscriptions/fs123/workspaces/ws-1/exports"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"error": "Invalid schedule"})),
            )
            .mount(&server)
            .await;

        let err = assert_err!(export::create_export(&client_for(&server), &gcs_export()).await);
        assert_eq!(err.to_string(), "Invalid schedule (status code: 400)");
    }

    /// Test 401 and 429 map to their own kinds
    #[tokio::test]
    async fn test_401_and_429() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/subscriptions/fs123/workspaces"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/subscriptions/fs123/workspaces/ws-1"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(matches!(
            assert_err!(workspace::list_workspaces(&client).await),
            FunnelError::Unauthorized
        ));
        assert!(matches!(
            assert_err!(workspace::read_workspace(&client, "ws-1").await),
            FunnelError::RateLimited
        ));
    }

    /// Test other failures keep status and body
    #[tokio::test]
    async fn test_500_is_generic_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/subscriptions/fs123/workspaces"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = assert_err!(workspace::list_workspaces(&client_for(&server)).await);
        assert_eq!(err.status_code(), Some(503));
        assert_eq!(err.details(), Some(&json!("maintenance")));
    }
}

/// Export lifecycle against the mocked API
mod export_tests {
    use super::*;

    /// Test the create payload shape and that the assigned id is kept
    #[tokio::test]
    async fn test_create_gcs_export() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/subscriptions/fs123/workspaces/ws-1/exports"))
            .and(bearer_token("test-token"))
            .and(header("content-type", "application/json"))
            .and(body_partial_json(json!({
                "type": "gcs",
                "onlyAllowEditFromAPI": true,
                "format": {"type": "raw", "metrics": "export", "headers": "safename"},
                "destination": {"type": "gcs", "gzip": true, "bucket": "acme-exports"},
                "query": {
                    "fields": [{"id": "cost", "name": "Cost"}],
                    "where": {"=and": [{"brand": {"=eq": "acme"}}]}
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "exp-1",
                "type": "gcs",
                "destination": {"type": "gcs", "gzip": true}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let created = assert_ok!(export::create_export(&client_for(&server), &gcs_export()).await);
        assert_eq!(created.shared.id.as_deref(), Some("exp-1"));
        assert_eq!(created.destination.gzip, Some(true));
    }

    /// Test a read flattens the query and restores sentinels
    #[tokio::test]
    async fn test_read_gcs_export() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/subscriptions/fs123/workspaces/ws-1/exports/exp-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "exp-1",
                "name": "daily",
                "type": "gcs",
                "workspace": "ws-other",
                "currency": "*",
                "format": {"type": "raw", "metrics": "export", "headers": "safename"},
                "partitionSchema": {"by": "date", "per": "month"},
                "destination": {"type": "gcs", "bucket": "acme-exports", "gzip": true},
                "query": {
                    "fields": [{"id": "cost", "type": "currency", "name": "Cost"}],
                    "range": {"last": {"periods": 7, "period": "days"}},
                    "where": {"=and": [
                        {"brand": {"=or": [{"=contains": "burger king"}, {"=notcontains": "wendys"}]}},
                        {"date": {"=after": "2025"}}
                    ]}
                }
            })))
            .mount(&server)
            .await;

        let found = assert_ok!(
            export::read_export::<GcsExport>(&client_for(&server), "ws-1", "exp-1").await
        )
        .expect("export exists");

        assert_eq!(found.shared.workspace.as_deref(), Some("ws-1"));
        assert_eq!(found.shared.id.as_deref(), Some("exp-1"));
        assert!(found.shared.currency.is_none());
        assert_eq!(found.shared.format.format_type.as_deref(), Some("parquet"));
        assert_eq!(found.shared.fields[0].export_name.as_deref(), Some("Cost"));
        assert_eq!(
            found.shared.partition_schema.per,
            Some(model::PartitionPer::Month)
        );
        assert_eq!(
            found.shared.range.rolling_start,
            Some(model::RollingDate {
                periods: Some(7),
                period: Some("days".to_string()),
            })
        );
        assert_eq!(found.shared.filters.len(), 2);
        assert_eq!(found.shared.filters[0].or.len(), 2);
        assert_eq!(found.shared.filters[1].operation.as_deref(), Some("after"));
    }

    /// Test odd filter entries are skipped and a disabled export stays disabled
    #[tokio::test]
    async fn test_read_lenient_filter_and_disabled_flag() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/subscriptions/fs123/workspaces/ws-1/exports/exp-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "exp-1",
                "type": "gcs",
                "enabled": false,
                "destination": {"type": "gcs"},
                "query": {
                    "range": {"rollingEnd": {"periods": 0, "period": "days"}},
                    "where": {"=and": [
                        {"brand": {"=eq": "a"}},
                        {"date": {"label": "x"}},
                        "junk"
                    ]}
                }
            })))
            .mount(&server)
            .await;

        let found = assert_ok!(
            export::read_export::<GcsExport>(&client_for(&server), "ws-1", "exp-1").await
        )
        .expect("export exists");

        assert_eq!(found.shared.enabled, Some(false));
        assert_eq!(
            found.shared.range.rolling_end,
            Some(model::RollingDate {
                periods: Some(0),
                period: Some("days".to_string()),
            })
        );
        assert_eq!(found.shared.filters.len(), 2);
        assert_eq!(found.shared.filters[0].operation.as_deref(), Some("eq"));
        assert_eq!(found.shared.filters[1].field_id.as_deref(), Some("date"));
        assert!(found.shared.filters[1].operation.is_none());
    }

    /// Test an unusable filter value is a conversion error, not a bad response
    #[tokio::test]
    async fn test_read_bad_filter_value() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/subscriptions/fs123/workspaces/ws-1/exports/exp-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "exp-1",
                "type": "gcs",
                "destination": {"type": "gcs"},
                "query": {"where": {"=and": [{"brand": {"=eq": 3}}]}}
            })))
            .mount(&server)
            .await;

        let err = assert_err!(
            export::read_export::<GcsExport>(&client_for(&server), "ws-1", "exp-1").await
        );
        assert!(matches!(err, FunnelError::Conversion(_)));
    }

    /// Test reading an export of another destination fails
    #[tokio::test]
    async fn test_read_wrong_destination() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/subscriptions/fs123/workspaces/ws-1/exports/exp-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "exp-1",
                "type": "gcs",
                "destination": {"type": "gcs"}
            })))
            .mount(&server)
            .await;

        let err = assert_err!(
            export::read_export::<BigQueryExport>(&client_for(&server), "ws-1", "exp-1").await
        );
        assert_eq!(err.to_string(), "export exp-1 is not a BigQuery export (type: gcs)");
    }

    /// Test import splits the id and keeps both parts
    #[tokio::test]
    async fn test_import_measurement_export() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/subscriptions/fs123/workspaces/ws-1/exports/exp-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "type": "iceberg",
                "hidden": true,
                "destination": {"type": "iceberg", "outputIdTemplate": "mmm_daily"},
                "snapshotQuery": {"snapshotTableId": "t1", "sourceId": "s1", "sourceType": "adwords"},
                "partitionSchema": {"by": "snapshot"}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let imported: MeasurementExport =
            assert_ok!(export::import_export(&client, "ws-1/exp-2").await);

        assert_eq!(imported.shared.id.as_deref(), Some("exp-2"));
        assert_eq!(imported.shared.workspace.as_deref(), Some("ws-1"));
        assert_eq!(imported.destination.table_name.as_deref(), Some("mmm_daily"));
        assert_eq!(imported.destination.snapshot_source_id.as_deref(), Some("s1"));

        let err = assert_err!(export::import_export::<MeasurementExport>(&client, "exp-2").await);
        assert!(matches!(err, FunnelError::InvalidImportId(_)));
    }
}

/// Workspaces, data sources and field lookups
mod entity_tests {
    use super::*;

    /// Test workspace create reads the id from `workspaceId`
    #[tokio::test]
    async fn test_create_workspace() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/subscriptions/fs123/workspaces"))
            .and(body_json(json!({"name": "Marketing"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"workspaceId": "ws-7"})))
            .expect(1)
            .mount(&server)
            .await;

        let requested = model::Workspace {
            id: None,
            name: Some("Marketing".to_string()),
        };
        let created = assert_ok!(workspace::create_workspace(&client_for(&server), &requested).await);
        assert_eq!(created.id.as_deref(), Some("ws-7"));
        assert_eq!(created.name.as_deref(), Some("Marketing"));
    }

    /// Test a read without an id in the body keeps the requested one
    #[tokio::test]
    async fn test_read_workspace() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/subscriptions/fs123/workspaces/ws-3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "Sandbox"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/subscriptions/fs123/workspaces/ws-4"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"workspaceId": "ws-4", "name": ""})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);

        let found = assert_ok!(workspace::read_workspace(&client, "ws-3").await)
            .expect("workspace exists");
        assert_eq!(found.id.as_deref(), Some("ws-3"));
        assert_eq!(found.name.as_deref(), Some("Sandbox"));

        let found = assert_ok!(workspace::read_workspace(&client, "ws-4").await)
            .expect("workspace exists");
        assert_eq!(found.id.as_deref(), Some("ws-4"));
        assert!(found.name.is_none());
    }

    /// Test workspace limit is a 403
    #[tokio::test]
    async fn test_create_workspace_limit() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/subscriptions/fs123/workspaces"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({"limit": 3})))
            .mount(&server)
            .await;

        let requested = model::Workspace {
            id: None,
            name: Some("One too many".to_string()),
        };
        let err = assert_err!(workspace::create_workspace(&client_for(&server), &requested).await);
        assert!(matches!(err, FunnelError::Forbidden { .. }));
        assert_eq!(err.details(), Some(&json!({"limit": 3})));
    }

    /// Test workspace listing reads the `data` envelope
    #[tokio::test]
    async fn test_list_workspaces() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/subscriptions/fs123/workspaces"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": "ws-1", "name": "Main"}, {"id": "ws-2", "name": "Sandbox"}]
            })))
            .mount(&server)
            .await;

        let workspaces = assert_ok!(workspace::list_workspaces(&client_for(&server)).await);
        assert_eq!(workspaces.len(), 2);
        assert_eq!(workspaces[1].name.as_deref(), Some("Sandbox"));
    }

    /// Test data source create conflict
    #[tokio::test]
    async fn test_create_data_source_conflict() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/subscriptions/fs123/workspaces/ws-1/datasources"))
            .and(body_partial_json(json!({
                "workspace": "ws-1",
                "sourceType": "adwords",
                "accountId": "123-456"
            })))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({"id": "ds-1"})))
            .mount(&server)
            .await;

        let requested = model::DataSource {
            workspace: Some("ws-1".to_string()),
            source_type: Some("adwords".to_string()),
            credential_id: Some("cred-1".to_string()),
            account_id: Some("123-456".to_string()),
            name: Some("Ads".to_string()),
            ..Default::default()
        };
        let err = assert_err!(data_source::create_data_source(&client_for(&server), &requested).await);
        assert_eq!(err.status_code(), Some(409));
    }

    /// Test field lookup defaults the export name
    #[tokio::test]
    async fn test_get_export_field() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/subscriptions/fs123/workspaces/ws-1/fields/cost"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "cost",
                "name": "Cost",
                "type": "currency",
                "exportType": "FLOAT64"
            })))
            .mount(&server)
            .await;

        let field = assert_ok!(
            export_field::get_export_field(&client_for(&server), "ws-1", "cost", None, None).await
        );
        assert_eq!(field.export_name.as_deref(), Some("Cost"));
        assert_eq!(field.workspace.as_deref(), Some("ws-1"));
        assert_eq!(field.field_type.as_deref(), Some("currency"));
    }
}
