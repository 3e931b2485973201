use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::Deserialize;

use super::SheetSource;
use crate::error::SourceError;

const DRIVE_API: &str = "https://www.googleapis.com/drive/v3/";
const SHEETS_API: &str = "https://sheets.googleapis.com/v4/";
const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

/// Base URLs of the two Google APIs the source talks to.
#[derive(Clone, Debug)]
pub struct GoogleEndpoints {
    pub drive: Url,
    pub sheets: Url,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        GoogleEndpoints {
            drive: Url::parse(DRIVE_API).expect("static URL"),
            sheets: Url::parse(SHEETS_API).expect("static URL"),
        }
    }
}

/// Credential blob accepted in `SHEET_CREDENTIALS_JSON`.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum SheetCredentials {
    Token { access_token: String },
    ApiKey { api_key: String },
}

impl SheetCredentials {
    pub fn parse(raw: &str) -> Result<Self, SourceError> {
        serde_json::from_str(raw).map_err(|_| {
            SourceError::Configuration(
                "sheet credentials must be JSON with an \"access_token\" or \"api_key\" field"
                    .to_string(),
            )
        })
    }

    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            SheetCredentials::Token { access_token } => request.bearer_auth(access_token),
            SheetCredentials::ApiKey { api_key } => request.query(&[("key", api_key)]),
        }
    }
}

#[derive(Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// A worksheet in a Google Sheets document, looked up by document name.
pub struct GoogleSheetsSource {
    http: Client,
    endpoints: GoogleEndpoints,
    credentials: Option<String>,
    document: String,
    worksheet: String,
}

impl GoogleSheetsSource {
    pub fn new(
        credentials: Option<String>,
        document: impl Into<String>,
        worksheet: impl Into<String>,
    ) -> Self {
        GoogleSheetsSource {
            http: Client::new(),
            endpoints: GoogleEndpoints::default(),
            credentials,
            document: document.into(),
            worksheet: worksheet.into(),
        }
    }

    pub fn with_endpoints(mut self, endpoints: GoogleEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    fn credentials(&self) -> Result<SheetCredentials, SourceError> {
        let raw = self.credentials.as_deref().ok_or_else(|| {
            SourceError::Configuration(
                "SHEET_CREDENTIALS_JSON environment variable not set.".to_string(),
            )
        })?;
        SheetCredentials::parse(raw)
    }

    fn endpoint(base: &Url, path: &str) -> Result<Url, SourceError> {
        base.join(path)
            .map_err(|e| SourceError::Configuration(format!("bad API URL: {}", e)))
    }

    async fn find_document(&self, creds: &SheetCredentials) -> Result<String, SourceError> {
        let query = format!(
            "name = '{}' and mimeType = '{}' and trashed = false",
            self.document.replace('\\', "\\\\").replace('\'', "\\'"),
            SPREADSHEET_MIME
        );
        let url = Self::endpoint(&self.endpoints.drive, "files")?;
        let request = self.http.get(url).query(&[
            ("q", query.as_str()),
            ("fields", "files(id)"),
            ("pageSize", "1"),
        ]);
        let response = checked(creds.apply(request).send().await?).await?;
        let listing: FileList = response.json().await?;

        listing
            .files
            .into_iter()
            .next()
            .map(|file| file.id)
            .ok_or_else(|| SourceError::DocumentNotFound(self.document.clone()))
    }

    async fn ensure_worksheet(
        &self,
        creds: &SheetCredentials,
        spreadsheet_id: &str,
    ) -> Result<(), SourceError> {
        let url = Self::endpoint(
            &self.endpoints.sheets,
            &format!("spreadsheets/{}", spreadsheet_id),
        )?;
        let request = self
            .http
            .get(url)
            .query(&[("fields", "sheets.properties.title")]);
        let response = creds.apply(request).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(SourceError::DocumentNotFound(self.document.clone()));
        }
        let meta: SpreadsheetMeta = checked(response).await?.json().await?;

        if meta
            .sheets
            .iter()
            .any(|sheet| sheet.properties.title == self.worksheet)
        {
            Ok(())
        } else {
            Err(SourceError::SheetNotFound(self.worksheet.clone()))
        }
    }

    async fn read_values(
        &self,
        creds: &SheetCredentials,
        spreadsheet_id: &str,
    ) -> Result<Vec<Vec<String>>, SourceError> {
        // A1 notation: a sheet title is quoted, with inner quotes doubled.
        let range = format!("'{}'", self.worksheet.replace('\'', "''"));
        let url = Self::endpoint(
            &self.endpoints.sheets,
            &format!(
                "spreadsheets/{}/values/{}",
                spreadsheet_id,
                urlencoding::encode(&range)
            ),
        )?;
        let request = self.http.get(url).query(&[
            ("majorDimension", "ROWS"),
            ("valueRenderOption", "FORMATTED_VALUE"),
        ]);
        let values: ValueRange = checked(creds.apply(request).send().await?)
            .await?
            .json()
            .await?;
        Ok(values.values)
    }
}

/// Turn a non-success HTTP status into an error carrying the response body.
async fn checked(response: reqwest::Response) -> Result<reqwest::Response, SourceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(SourceError::Unexpected(format!(
        "Google API returned {}: {}",
        status,
        body.trim()
    )))
}

#[async_trait]
impl SheetSource for GoogleSheetsSource {
    async fn fetch_grid(&self) -> Result<Vec<Vec<String>>, SourceError> {
        let creds = self.credentials()?;
        let spreadsheet_id = self.find_document(&creds).await?;
        self.ensure_worksheet(&creds, &spreadsheet_id).await?;
        self.read_values(&creds, &spreadsheet_id).await
    }

    fn describe(&self) -> String {
        format!("Google Sheets '{}' / '{}'", self.document, self.worksheet)
    }
}
