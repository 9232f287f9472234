use super::types::{
    CatalogInfo, CreateCatalogRequest, CreateSchemaRequest, GroupInfo, ListCatalogsResponse,
    ListSchemasResponse, ListTablesResponse, PermissionsChange, PermissionsList, SchemaInfo,
    ScimListResponse, SecurableType, TableInfo, UpdatePermissionsRequest, UserInfo,
};
use crate::config::WorkspaceConfig;
use crate::error::{Error, Result};
use crate::http::HttpClient;
use reqwest::Url;
use tracing::info;

const UNITY_CATALOG_API: &str = "/api/2.1/unity-catalog";
const SCIM_API: &str = "/api/2.0/preview/scim/v2";

/// Authenticated client for a Databricks workspace: Unity Catalog objects,
/// SCIM principals, and the permissions API.
pub struct WorkspaceClient {
    host: String,
    token: String,
    http: HttpClient,
}

impl WorkspaceClient {
    pub fn new(config: &WorkspaceConfig) -> Result<Self> {
        let http = HttpClient::new("uc-steward/0.1.0")?;
        Ok(Self {
            host: config.host.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            http,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Listing endpoint with query parameters, e.g. `schemas?catalog_name=x`.
    /// Values go through the URL encoder, so names the LLM produced with
    /// spaces or slashes reach the API intact instead of mangling the path.
    fn listing_url(&self, resource: &str, query: &[(&str, &str)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{UNITY_CATALOG_API}/{resource}", self.host))
            .map_err(|e| Error::http(format!("invalid workspace URL: {e}")))?;
        for (key, value) in query {
            url.query_pairs_mut().append_pair(key, value);
        }
        Ok(url)
    }

    /// Permissions endpoint for one securable, with `full_name` encoded as a
    /// single path segment.
    fn permissions_url(&self, securable_type: SecurableType, full_name: &str) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{UNITY_CATALOG_API}/permissions", self.host))
            .map_err(|e| Error::http(format!("invalid workspace URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| Error::http("workspace host is not a valid base URL"))?
            .push(&securable_type.to_string())
            .push(full_name);
        Ok(url)
    }

    pub async fn list_catalogs(&self) -> Result<Vec<CatalogInfo>> {
        let url = format!("{}{UNITY_CATALOG_API}/catalogs", self.host);
        let resp: ListCatalogsResponse = self.http.get_json_authed(&url, &self.token).await?;
        info!(count = resp.catalogs.len(), "listed catalogs");
        Ok(resp.catalogs)
    }

    pub async fn create_catalog(&self, name: &str, comment: Option<&str>) -> Result<CatalogInfo> {
        let url = format!("{}{UNITY_CATALOG_API}/catalogs", self.host);
        let payload = CreateCatalogRequest {
            name: name.to_string(),
            comment: comment.map(str::to_string),
        };
        let catalog: CatalogInfo = self
            .http
            .post_json_authed(&url, &self.token, &payload)
            .await?;
        info!(catalog = %catalog.name, "created catalog");
        Ok(catalog)
    }

    pub async fn list_schemas(&self, catalog: &str) -> Result<Vec<SchemaInfo>> {
        let url = self.listing_url("schemas", &[("catalog_name", catalog)])?;
        let resp: ListSchemasResponse = self.http.get_json_authed(url.as_str(), &self.token).await?;
        info!(catalog, count = resp.schemas.len(), "listed schemas");
        Ok(resp.schemas)
    }

    pub async fn list_tables(&self, catalog: &str, schema: &str) -> Result<Vec<TableInfo>> {
        let url = self.listing_url(
            "tables",
            &[("catalog_name", catalog), ("schema_name", schema)],
        )?;
        let resp: ListTablesResponse = self.http.get_json_authed(url.as_str(), &self.token).await?;
        info!(catalog, schema, count = resp.tables.len(), "listed tables");
        Ok(resp.tables)
    }

    pub async fn create_schema(
        &self,
        catalog: &str,
        name: &str,
        comment: Option<&str>,
    ) -> Result<SchemaInfo> {
        let url = format!("{}{UNITY_CATALOG_API}/schemas", self.host);
        let payload = CreateSchemaRequest {
            name: name.to_string(),
            catalog_name: catalog.to_string(),
            comment: comment.map(str::to_string),
        };
        let schema: SchemaInfo = self
            .http
            .post_json_authed(&url, &self.token, &payload)
            .await?;
        info!(catalog, schema = %schema.name, "created schema");
        Ok(schema)
    }

    pub async fn list_users(&self) -> Result<Vec<UserInfo>> {
        let url = format!("{}{SCIM_API}/Users", self.host);
        let resp: ScimListResponse<UserInfo> = self.http.get_json_authed(&url, &self.token).await?;
        info!(count = resp.resources.len(), "listed users");
        Ok(resp.resources)
    }

    pub async fn list_groups(&self) -> Result<Vec<GroupInfo>> {
        let url = format!("{}{SCIM_API}/Groups", self.host);
        let resp: ScimListResponse<GroupInfo> =
            self.http.get_json_authed(&url, &self.token).await?;
        info!(count = resp.resources.len(), "listed groups");
        Ok(resp.resources)
    }

    pub async fn get_grants(
        &self,
        securable_type: SecurableType,
        full_name: &str,
    ) -> Result<PermissionsList> {
        let url = self.permissions_url(securable_type, full_name)?;
        self.http.get_json_authed(url.as_str(), &self.token).await
    }

    /// Apply a set of grant/revoke changes to a securable. Returns the
    /// resulting permission assignments as reported by the workspace.
    pub async fn update_grants(
        &self,
        securable_type: SecurableType,
        full_name: &str,
        changes: Vec<PermissionsChange>,
    ) -> Result<PermissionsList> {
        let url = self.permissions_url(securable_type, full_name)?;
        let payload = UpdatePermissionsRequest { changes };
        let perms: PermissionsList = self
            .http
            .patch_json_authed(url.as_str(), &self.token, &payload)
            .await?;
        info!(%securable_type, full_name, "updated grants");
        Ok(perms)
    }
}
