// MinIO / S3-compatible backend
//
// Path-style requests over blocking HTTP, signed with AWS Signature V4.
// Object names are `folder + filename` inside the configured bucket.

use super::{BlobStore, StorageResult};
use crate::config::MinioSettings;
use crate::error::StorageError;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::{BytesRef, Event};
use quick_xml::Reader;
use reqwest::blocking::{Client, Response};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

// ── Signing ─────────────────────────────────────────────────────────

fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> StorageResult<Vec<u8>> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|e| StorageError::Signing(e.to_string()))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn uri_encode(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

/// `/bucket` or `/bucket/<encoded key segments>`
fn canonical_uri(bucket: &str, object: Option<&str>) -> String {
    let mut uri = format!("/{}", uri_encode(bucket));
    if let Some(object) = object {
        for segment in object.split('/') {
            uri.push('/');
            uri.push_str(&uri_encode(segment));
        }
    }
    uri
}

/// Encoded and sorted by key, as both the signature and the URL need it
fn canonical_query(params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (uri_encode(k), uri_encode(v)))
        .collect();
    encoded.sort();

    encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

struct Signer {
    access_key: String,
    secret_key: String,
    region: String,
}

impl Signer {
    fn scope(&self, date: &str) -> String {
        format!("{}/{}/s3/aws4_request", date, self.region)
    }

    fn signing_key(&self, date: &str) -> StorageResult<Vec<u8>> {
        let k_date = hmac_sha256(format!("AWS4{}", self.secret_key).as_bytes(), date.as_bytes())?;
        let k_region = hmac_sha256(&k_date, self.region.as_bytes())?;
        let k_service = hmac_sha256(&k_region, b"s3")?;
        hmac_sha256(&k_service, b"aws4_request")
    }

    fn signature(&self, canonical_request: &str, now: DateTime<Utc>) -> StorageResult<String> {
        let date = now.format("%Y%m%d").to_string();
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            now.format("%Y%m%dT%H%M%SZ"),
            self.scope(&date),
            sha256_hex(canonical_request.as_bytes())
        );
        let key = self.signing_key(&date)?;
        Ok(hex(&hmac_sha256(&key, string_to_sign.as_bytes())?))
    }

    /// `Authorization` header value. `headers` must be lowercase and sorted.
    fn authorization(
        &self,
        method: &str,
        uri: &str,
        query: &[(String, String)],
        headers: &[(&str, String)],
        payload_hash: &str,
        now: DateTime<Utc>,
    ) -> StorageResult<String> {
        let canonical_headers: String = headers
            .iter()
            .map(|(k, v)| format!("{}:{}\n", k, v.trim()))
            .collect();
        let signed_headers = headers
            .iter()
            .map(|(k, _)| *k)
            .collect::<Vec<_>>()
            .join(";");

        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            method,
            uri,
            canonical_query(query),
            canonical_headers,
            signed_headers,
            payload_hash
        );

        Ok(format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM,
            self.access_key,
            self.scope(&now.format("%Y%m%d").to_string()),
            signed_headers,
            self.signature(&canonical_request, now)?
        ))
    }

    /// Query string (signature included) for a presigned GET
    fn presign_query(
        &self,
        host: &str,
        uri: &str,
        expires: u64,
        now: DateTime<Utc>,
    ) -> StorageResult<String> {
        let date = now.format("%Y%m%d").to_string();
        let params = vec![
            ("X-Amz-Algorithm".to_string(), ALGORITHM.to_string()),
            (
                "X-Amz-Credential".to_string(),
                format!("{}/{}", self.access_key, self.scope(&date)),
            ),
            (
                "X-Amz-Date".to_string(),
                now.format("%Y%m%dT%H%M%SZ").to_string(),
            ),
            ("X-Amz-Expires".to_string(), expires.to_string()),
            ("X-Amz-SignedHeaders".to_string(), "host".to_string()),
        ];
        let query = canonical_query(&params);

        let canonical_request = format!(
            "GET\n{}\n{}\nhost:{}\n\nhost\n{}",
            uri, query, host, UNSIGNED_PAYLOAD
        );

        Ok(format!(
            "{}&X-Amz-Signature={}",
            query,
            self.signature(&canonical_request, now)?
        ))
    }
}

// ── ListObjectsV2 response ──────────────────────────────────────────

fn invalid_xml(e: impl std::fmt::Display) -> StorageError {
    StorageError::InvalidResponse(format!("malformed listing: {}", e))
}

/// Text of a `&...;` reference: character references and the predefined entities
fn resolve_reference(reference: &BytesRef) -> StorageResult<String> {
    if let Some(ch) = reference.resolve_char_ref().map_err(invalid_xml)? {
        return Ok(ch.to_string());
    }
    let name = reference.decode().map_err(invalid_xml)?;
    resolve_xml_entity(&name)
        .map(str::to_string)
        .ok_or_else(|| invalid_xml(format!("unknown entity &{};", name)))
}

#[derive(Clone, Copy)]
enum ListField {
    Key,
    IsTruncated,
    NextContinuationToken,
}

impl ListField {
    fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"Key" => Some(ListField::Key),
            b"IsTruncated" => Some(ListField::IsTruncated),
            b"NextContinuationToken" => Some(ListField::NextContinuationToken),
            _ => None,
        }
    }
}

struct ListPage {
    keys: Vec<String>,
    next_token: Option<String>,
}

/// One ListObjectsV2 response body
fn parse_list_page(xml: &str) -> StorageResult<ListPage> {
    let mut reader = Reader::from_str(xml);

    let mut keys = Vec::new();
    let mut truncated = false;
    let mut token = None;
    let mut field: Option<ListField> = None;
    let mut text = String::new();

    loop {
        match reader.read_event().map_err(invalid_xml)? {
            Event::Start(e) => {
                field = ListField::from_tag(e.name().as_ref());
                text.clear();
            }
            Event::Text(e) if field.is_some() => {
                text.push_str(&e.decode().map_err(invalid_xml)?);
            }
            Event::GeneralRef(reference) if field.is_some() => {
                text.push_str(&resolve_reference(&reference)?);
            }
            Event::End(_) => match field.take() {
                Some(ListField::Key) => keys.push(std::mem::take(&mut text)),
                Some(ListField::IsTruncated) => truncated = text.trim() == "true",
                Some(ListField::NextContinuationToken) => token = Some(std::mem::take(&mut text)),
                None => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    let next_token = if truncated {
        if token.is_none() {
            return Err(StorageError::InvalidResponse(
                "truncated listing without NextContinuationToken".to_string(),
            ));
        }
        token
    } else {
        None
    };

    Ok(ListPage { keys, next_token })
}

// ── Client ──────────────────────────────────────────────────────────

pub struct MinioStore {
    client: Client,
    signer: Signer,
    base_url: String,
    host: String,
    bucket: String,
    presigned_expiry: u64,
}

impl MinioStore {
    /// Build the client without touching the network
    pub fn new(settings: &MinioSettings, presigned_expiry: u64) -> StorageResult<Self> {
        let scheme = if settings.secure { "https" } else { "http" };
        let endpoint = settings.endpoint.trim_end_matches('/');

        // The HTTP client drops a default port from the Host header, so the
        // signed host must not carry it either
        let default_port = if settings.secure { ":443" } else { ":80" };
        let host = endpoint
            .strip_suffix(default_port)
            .unwrap_or(endpoint)
            .to_string();

        Ok(MinioStore {
            client: Client::builder().build()?,
            signer: Signer {
                access_key: settings.access_key.clone(),
                secret_key: settings.secret_key.clone(),
                region: settings.region.clone(),
            },
            base_url: format!("{}://{}", scheme, host),
            host,
            bucket: settings.bucket.clone(),
            presigned_expiry,
        })
    }

    /// Build the client and create the bucket if it does not exist
    pub fn connect(settings: &MinioSettings, presigned_expiry: u64) -> StorageResult<Self> {
        let store = MinioStore::new(settings, presigned_expiry)?;
        store.ensure_bucket()?;
        Ok(store)
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn ensure_bucket(&self) -> StorageResult<()> {
        let response = self.send(Method::HEAD, None, &[], Vec::new(), None)?;
        if response.status() == StatusCode::NOT_FOUND {
            let response = self.send(Method::PUT, None, &[], Vec::new(), None)?;
            check("create bucket", &self.bucket, response)?;
            tracing::info!(bucket = %self.bucket, "created bucket");
            return Ok(());
        }

        check("check bucket", &self.bucket, response).map(|_| ())
    }

    fn send(
        &self,
        method: Method,
        object: Option<&str>,
        query: &[(String, String)],
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> StorageResult<Response> {
        let now = Utc::now();
        let uri = canonical_uri(&self.bucket, object);
        let payload_hash = sha256_hex(&body);
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();

        let headers = [
            ("host", self.host.clone()),
            ("x-amz-content-sha256", payload_hash.clone()),
            ("x-amz-date", amz_date.clone()),
        ];
        let authorization =
            self.signer
                .authorization(method.as_str(), &uri, query, &headers, &payload_hash, now)?;

        let mut url = format!("{}{}", self.base_url, uri);
        let query_string = canonical_query(query);
        if !query_string.is_empty() {
            url.push('?');
            url.push_str(&query_string);
        }

        let mut request = self
            .client
            .request(method, url)
            .header("x-amz-content-sha256", payload_hash)
            .header("x-amz-date", amz_date)
            .header(AUTHORIZATION, authorization);
        if let Some(content_type) = content_type {
            request = request.header(CONTENT_TYPE, content_type);
        }

        Ok(request.body(body).send()?)
    }

    fn presigned_get(&self, object: &str, now: DateTime<Utc>) -> StorageResult<String> {
        let uri = canonical_uri(&self.bucket, Some(object));
        let query = self
            .signer
            .presign_query(&self.host, &uri, self.presigned_expiry, now)?;
        Ok(format!("{}{}?{}", self.base_url, uri, query))
    }
}

fn check(operation: &'static str, object: &str, response: Response) -> StorageResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    Err(StorageError::Status {
        operation,
        object: object.to_string(),
        status: status.as_u16(),
        body,
    })
}

impl BlobStore for MinioStore {
    fn upload(&self, data: &[u8], filename: &str, folder: &str) -> StorageResult<String> {
        let object = format!("{}{}", folder, filename);
        let response = self.send(
            Method::PUT,
            Some(&object),
            &[],
            data.to_vec(),
            Some("text/csv"),
        )?;
        check("upload", &object, response)?;
        Ok(object)
    }

    fn download(&self, identifier: &str) -> StorageResult<Vec<u8>> {
        let response = self.send(Method::GET, Some(identifier), &[], Vec::new(), None)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound(identifier.to_string()));
        }
        let response = check("download", identifier, response)?;
        Ok(response.bytes()?.to_vec())
    }

    fn list(&self, folder: &str) -> StorageResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let mut query = vec![
                ("list-type".to_string(), "2".to_string()),
                ("prefix".to_string(), folder.to_string()),
            ];
            if let Some(token) = &token {
                query.push(("continuation-token".to_string(), token.clone()));
            }

            let response = self.send(Method::GET, None, &query, Vec::new(), None)?;
            let body = check("list", folder, response)?.text()?;
            let page = parse_list_page(&body)?;

            keys.extend(page.keys);
            match page.next_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        keys.sort();
        Ok(keys)
    }

    fn delete(&self, identifier: &str) -> StorageResult<bool> {
        let response = self.send(Method::DELETE, Some(identifier), &[], Vec::new(), None)?;
        check("delete", identifier, response)?;
        Ok(true)
    }

    fn presigned_url(&self, identifier: &str) -> StorageResult<Option<String>> {
        self.presigned_get(identifier, Utc::now()).map(Some)
    }

    fn backend_name(&self) -> &str {
        "minio"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 30, 45).unwrap()
    }

    fn signer() -> Signer {
        Signer {
            access_key: "minioadmin".to_string(),
            secret_key: "minioadmin".to_string(),
            region: "us-east-1".to_string(),
        }
    }

    #[test]
    fn test_sha256_hex_empty_payload() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_canonical_uri_encodes_segments() {
        assert_eq!(canonical_uri("kpop-budget", None), "/kpop-budget");
        assert_eq!(
            canonical_uri("kpop-budget", Some("gold/konser analytics.csv")),
            "/kpop-budget/gold/konser%20analytics.csv"
        );
    }

    #[test]
    fn test_canonical_query_sorted_and_encoded() {
        let params = vec![
            ("prefix".to_string(), "bronze/".to_string()),
            ("list-type".to_string(), "2".to_string()),
        ];
        assert_eq!(canonical_query(&params), "list-type=2&prefix=bronze%2F");
        assert_eq!(canonical_query(&[]), "");
    }

    #[test]
    fn test_authorization_header_shape() {
        let headers = [
            ("host", "localhost:9000".to_string()),
            ("x-amz-content-sha256", sha256_hex(b"")),
            ("x-amz-date", "20240315T123045Z".to_string()),
        ];
        let auth = signer().authorization(
            "GET",
            "/kpop-budget",
            &[],
            &headers,
            &sha256_hex(b""),
            fixed_now(),
        )
        .unwrap();

        assert!(auth.starts_with(
            "AWS4-HMAC-SHA256 Credential=minioadmin/20240315/us-east-1/s3/aws4_request, \
             SignedHeaders=host;x-amz-content-sha256;x-amz-date, Signature="
        ));
        let signature = auth.rsplit("Signature=").next().unwrap();
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));

        // Deterministic for identical input
        let again = signer().authorization(
            "GET",
            "/kpop-budget",
            &[],
            &headers,
            &sha256_hex(b""),
            fixed_now(),
        )
        .unwrap();
        assert_eq!(auth, again);
    }

    #[test]
    fn test_signature_depends_on_secret() {
        let other = Signer {
            secret_key: "different".to_string(),
            ..signer()
        };
        let request = "GET\n/kpop-budget\n\nhost:localhost:9000\n\nhost\nUNSIGNED-PAYLOAD";

        assert_ne!(
            signer().signature(request, fixed_now()).unwrap(),
            other.signature(request, fixed_now()).unwrap()
        );
    }

    #[test]
    fn test_presigned_url() {
        let store = MinioStore::new(&MinioSettings::default(), 3600).unwrap();
        let url = store
            .presigned_get("gold/konser_analytics_20240315_123045.csv", fixed_now())
            .unwrap();

        assert!(url.starts_with(
            "http://localhost:9000/kpop-budget/gold/konser_analytics_20240315_123045.csv?"
        ));
        assert!(url.contains("X-Amz-Algorithm=AWS4-HMAC-SHA256"));
        assert!(url.contains(
            "X-Amz-Credential=minioadmin%2F20240315%2Fus-east-1%2Fs3%2Faws4_request"
        ));
        assert!(url.contains("X-Amz-Date=20240315T123045Z"));
        assert!(url.contains("X-Amz-Expires=3600"));
        assert!(url.contains("X-Amz-SignedHeaders=host"));
        assert!(url.contains("&X-Amz-Signature="));
    }

    #[test]
    fn test_default_port_dropped_from_host() {
        let settings = MinioSettings {
            endpoint: "minio.example.com:443".to_string(),
            secure: true,
            ..MinioSettings::default()
        };
        let store = MinioStore::new(&settings, 60).unwrap();

        assert_eq!(store.host, "minio.example.com");
        assert_eq!(store.base_url, "https://minio.example.com");
    }

    #[test]
    fn test_parse_list_page() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult>
  <Name>kpop-budget</Name><Prefix>bronze/</Prefix><KeyCount>2</KeyCount>
  <IsTruncated>true</IsTruncated>
  <NextContinuationToken>abc==</NextContinuationToken>
  <Contents><Key>bronze/konser_raw_20240101_000000.csv</Key><Size>10</Size></Contents>
  <Contents><Key>bronze/a&amp;b.csv</Key><Size>3</Size></Contents>
</ListBucketResult>"#;

        let page = parse_list_page(xml).unwrap();
        assert_eq!(
            page.keys,
            vec!["bronze/konser_raw_20240101_000000.csv", "bronze/a&b.csv"]
        );
        assert_eq!(page.next_token.as_deref(), Some("abc=="));

        let last = parse_list_page("<IsTruncated>false</IsTruncated>").unwrap();
        assert!(last.keys.is_empty());
        assert!(last.next_token.is_none());

        assert!(parse_list_page("<IsTruncated>true</IsTruncated>").is_err());
    }

    #[test]
    fn test_list_page_resolves_character_references() {
        let xml = "<IsTruncated>false</IsTruncated>\
                   <Contents><Key>bronze/a&#x0D;b.csv</Key></Contents>\
                   <Contents><Key>bronze/&lt;tab&#9;&gt;.csv</Key></Contents>";

        let page = parse_list_page(xml).unwrap();
        assert_eq!(page.keys, vec!["bronze/a\rb.csv", "bronze/<tab\t>.csv"]);
        assert!(page.next_token.is_none());
    }

    #[test]
    fn test_list_page_rejects_malformed_xml() {
        assert!(parse_list_page("<Contents><Key>bronze/x.csv</Contents>").is_err());
    }

    #[test]
    fn test_hmac_accepts_any_key_length() {
        assert_eq!(hmac_sha256(b"", b"data").unwrap().len(), 32);
        assert_eq!(hmac_sha256(&[7u8; 200], b"data").unwrap().len(), 32);
    }
}
