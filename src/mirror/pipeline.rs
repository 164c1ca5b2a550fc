// src/mirror/pipeline.rs
// =============================================================================
// The mirror pipeline: list a directory, download each entry, repeat.
//
// How it works:
// 1. Fetch the listing page for a directory (browse base + relative path)
// 2. Hand the HTML to a ListingParser to get the filenames
// 3. Fetch each file from the raw host (raw base + relative path + name)
// 4. Write the bytes to <dest_dir><name>, overwriting whatever is there
//    (dest_dir is a plain prefix: "./out/" gives ./out/A.c, "out-" gives out-A.c)
//
// Everything is sequential: each request finishes before the next starts.
// The first error ends the run; files already written stay on disk.
// =============================================================================

use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use tracing::{error, info, warn};
use url::Url;

use super::{DirectorySpec, DownloadResult, MirrorError, MirrorFailure};
use crate::config::MirrorConfig;
use crate::fetch::Fetcher;
use crate::listing::{Entry, ListingParser};

/// Fetches one directory's listing page and returns its entries in page order.
///
/// A listing with no matching rows is an empty Vec, not an error.
pub async fn list_entries<F, P>(
    fetcher: &F,
    parser: &P,
    spec: &DirectorySpec,
) -> Result<Vec<Entry>, MirrorError>
where
    F: Fetcher,
    P: ListingParser,
{
    let url = directory_url(&spec.browse_base_url, &spec.relative_path)?;

    let body = fetcher
        .fetch(&url)
        .await
        .map_err(|source| MirrorError::Fetch { url: url.clone(), source })?;

    // Listing pages are HTML; a stray invalid byte shouldn't lose the whole page
    let html = String::from_utf8_lossy(&body);
    let entries = parser.parse(&html);

    if entries.is_empty() {
        warn!(%url, "listing contains no entries");
    } else {
        info!(%url, count = entries.len(), "listed directory");
    }

    Ok(entries)
}

/// Downloads one entry from the raw host to `dest_dir` + `entry.name`.
///
/// `dest_dir` is prepended verbatim, so it normally ends with a separator.
/// It is not checked or created; if the directory is missing the write fails.
pub async fn download_entry<F>(
    fetcher: &F,
    spec: &DirectorySpec,
    entry: &Entry,
    dest_dir: &OsStr,
) -> Result<DownloadResult, MirrorError>
where
    F: Fetcher,
{
    ensure_safe_name(&entry.name)?;

    let url = file_url(&spec.raw_base_url, &spec.relative_path, &entry.name)?;

    let bytes = fetcher
        .fetch(&url)
        .await
        .map_err(|source| MirrorError::Fetch { url: url.clone(), source })?;

    let local_path = local_path(dest_dir, entry);
    tokio::fs::write(&local_path, &bytes)
        .await
        .map_err(|source| MirrorError::Write {
            path: local_path.clone(),
            source,
        })?;

    info!(
        name = %entry.name,
        path = %local_path.display(),
        bytes = bytes.len(),
        "downloaded"
    );

    Ok(DownloadResult {
        entry: entry.clone(),
        local_path,
        success: true,
    })
}

/// Mirrors the core directory and then the variant directory of `config`.
pub async fn mirror<F, P>(
    fetcher: &F,
    parser: &P,
    config: &MirrorConfig,
) -> Result<Vec<DownloadResult>, MirrorFailure>
where
    F: Fetcher,
    P: ListingParser,
{
    mirror_paths(
        fetcher,
        parser,
        &config.browse_base_url,
        &config.raw_base_url,
        &config.relative_paths(),
        &config.dest_dir,
    )
    .await
}

/// Mirrors each relative path in turn into the same `dest_dir`.
///
/// Results from all paths are accumulated into one list. Names are not
/// deduplicated across paths: a later directory's file overwrites an earlier
/// one with the same name.
pub async fn mirror_paths<F, P>(
    fetcher: &F,
    parser: &P,
    browse_base_url: &Url,
    raw_base_url: &Url,
    relative_paths: &[&str],
    dest_dir: &OsStr,
) -> Result<Vec<DownloadResult>, MirrorFailure>
where
    F: Fetcher,
    P: ListingParser,
{
    let mut results = Vec::new();

    for relative_path in relative_paths {
        let spec = DirectorySpec::new(browse_base_url.clone(), raw_base_url.clone(), *relative_path);

        let entries = match list_entries(fetcher, parser, &spec).await {
            Ok(entries) => entries,
            Err(error) => {
                error!(path = %relative_path, %error, "listing failed, aborting");
                return Err(MirrorFailure { results, error });
            }
        };

        for entry in entries {
            match download_entry(fetcher, &spec, &entry, dest_dir).await {
                Ok(result) => results.push(result),
                Err(error) => {
                    error!(name = %entry.name, %error, "download failed, aborting");
                    results.push(DownloadResult {
                        local_path: local_path(dest_dir, &entry),
                        entry,
                        success: false,
                    });
                    return Err(MirrorFailure { results, error });
                }
            }
        }
    }

    Ok(results)
}

// Plain concatenation: no separator is added between prefix and name
fn local_path(dest_dir: &OsStr, entry: &Entry) -> PathBuf {
    let mut path = OsString::from(dest_dir);
    path.push(&entry.name);
    PathBuf::from(path)
}

// The listing text ends up as a filename, so it must not climb out of dest_dir
fn ensure_safe_name(name: &str) -> Result<(), MirrorError> {
    let unsafe_name = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\');

    if unsafe_name {
        return Err(MirrorError::UnsafeEntryName(name.to_string()));
    }
    Ok(())
}

fn directory_url(base: &Url, relative_path: &str) -> Result<Url, MirrorError> {
    base.join(relative_path)
        .map_err(|e| invalid_url(base, relative_path, e.to_string()))
}

// Appends the name as one percent-encoded segment, so names containing
// '#', '?' or spaces still address the file rather than a fragment or query
fn file_url(base: &Url, relative_path: &str, name: &str) -> Result<Url, MirrorError> {
    let mut url = directory_url(base, relative_path)?;

    url.path_segments_mut()
        .map_err(|_| invalid_url(base, relative_path, "URL cannot have a path".to_string()))?
        .pop_if_empty()
        .push(name);

    Ok(url)
}

fn invalid_url(base: &Url, path: &str, reason: String) -> MirrorError {
    MirrorError::InvalidUrl {
        base: base.to_string(),
        path: path.to_string(),
        reason,
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why are these functions generic over F: Fetcher and P: ListingParser?
//    - The pipeline doesn't care how bytes arrive or how HTML is read
//    - main.rs passes the real HttpFetcher, tests pass an in-memory stub
//    - Generics are resolved at compile time, so there is no runtime cost
//
// 2. Why does MirrorFailure carry `results`?
//    - The run stops at the first error, but earlier files are already on disk
//    - Returning what finished lets the caller report partial progress
//
// 3. What is path_segments_mut()?
//    - A url-crate API to edit the path one segment at a time
//    - push() percent-encodes the segment for us
//    - pop_if_empty() drops the empty segment left by a trailing '/'
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchError;
    use crate::listing::SelectorListingParser;
    use std::cell::RefCell;
    use std::collections::HashMap;

    const BROWSE: &str = "http://listing.test/avr/";
    const RAW: &str = "http://raw.test/avr/";

    // In-memory Fetcher: serves canned bodies and records every request
    #[derive(Default)]
    struct StubFetcher {
        responses: HashMap<String, Result<Vec<u8>, FetchError>>,
        requests: RefCell<Vec<String>>,
    }

    impl StubFetcher {
        fn serve(mut self, url: &str, body: &[u8]) -> Self {
            self.responses.insert(url.to_string(), Ok(body.to_vec()));
            self
        }

        fn listing(self, relative_path: &str, names: &[&str]) -> Self {
            let url = format!("{BROWSE}{relative_path}");
            self.serve(&url, listing_html(names).as_bytes())
        }

        fn file(self, relative_path: &str, name: &str, body: &[u8]) -> Self {
            let url = format!("{RAW}{relative_path}{name}");
            self.serve(&url, body)
        }

        fn fail(mut self, url: &str, error: FetchError) -> Self {
            self.responses.insert(url.to_string(), Err(error));
            self
        }

        fn requested(&self) -> Vec<String> {
            self.requests.borrow().clone()
        }
    }

    impl Fetcher for StubFetcher {
        async fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
            self.requests.borrow_mut().push(url.to_string());
            self.responses
                .get(url.as_str())
                .cloned()
                .unwrap_or(Err(FetchError::Status(404)))
        }
    }

    fn listing_html(names: &[&str]) -> String {
        let rows: String = names
            .iter()
            .map(|name| {
                format!(
                    r#"<div role="row"><span class="css-truncate css-truncate-target"><a class="js-navigation-open Link--primary" href="/blob/{name}">{name}</a></span></div>"#
                )
            })
            .collect();
        format!("<html><body>{rows}</body></html>")
    }

    fn spec(relative_path: &str) -> DirectorySpec {
        DirectorySpec::new(
            Url::parse(BROWSE).unwrap(),
            Url::parse(RAW).unwrap(),
            relative_path,
        )
    }

    // Destination prefix for a directory: the path plus a trailing separator
    fn prefix_of(path: &std::path::Path) -> OsString {
        let mut prefix = path.as_os_str().to_os_string();
        prefix.push(std::path::MAIN_SEPARATOR_STR);
        prefix
    }

    fn prefix(dir: &tempfile::TempDir) -> OsString {
        prefix_of(dir.path())
    }

    async fn run(fetcher: &StubFetcher, paths: &[&str], dest: &OsStr) -> Result<Vec<DownloadResult>, MirrorFailure> {
        mirror_paths(
            fetcher,
            &SelectorListingParser::default(),
            &Url::parse(BROWSE).unwrap(),
            &Url::parse(RAW).unwrap(),
            paths,
            dest,
        )
        .await
    }

    #[tokio::test]
    async fn test_list_entries_in_document_order() {
        let fetcher = StubFetcher::default().listing("cores/arduino/", &["wiring.c", "Arduino.h", "main.cpp"]);

        let entries = list_entries(&fetcher, &SelectorListingParser::default(), &spec("cores/arduino/"))
            .await
            .unwrap();

        assert_eq!(
            entries,
            vec![Entry::new("wiring.c"), Entry::new("Arduino.h"), Entry::new("main.cpp")]
        );
        assert_eq!(fetcher.requested(), vec![format!("{BROWSE}cores/arduino/")]);
    }

    #[tokio::test]
    async fn test_list_entries_empty_listing_is_not_an_error() {
        let fetcher = StubFetcher::default().serve(
            &format!("{BROWSE}variants/none/"),
            b"<html><body><p>This directory is empty.</p></body></html>",
        );

        let entries = list_entries(&fetcher, &SelectorListingParser::default(), &spec("variants/none/"))
            .await
            .unwrap();

        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_list_entries_http_error() {
        let fetcher = StubFetcher::default();

        let result = list_entries(&fetcher, &SelectorListingParser::default(), &spec("variants/missing/")).await;

        assert!(matches!(
            result,
            Err(MirrorError::Fetch { source: FetchError::Status(404), .. })
        ));
    }

    #[tokio::test]
    async fn test_download_entry_writes_exact_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let body: &[u8] = b"\x00\x01binary\xffcontent";
        let fetcher = StubFetcher::default().file("cores/arduino/", "WString.cpp", body);

        let result = download_entry(&fetcher, &spec("cores/arduino/"), &Entry::new("WString.cpp"), &prefix(&dir))
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.local_path, dir.path().join("WString.cpp"));
        assert_eq!(std::fs::read(&result.local_path).unwrap(), body);
    }

    #[tokio::test]
    async fn test_download_entry_encodes_name_as_one_segment() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = StubFetcher::default().serve(&format!("{RAW}cores/arduino/odd%20%23name.h"), b"x");

        download_entry(&fetcher, &spec("cores/arduino/"), &Entry::new("odd #name.h"), &prefix(&dir))
            .await
            .unwrap();

        assert_eq!(std::fs::read(dir.path().join("odd #name.h")).unwrap(), b"x");
    }

    #[tokio::test]
    async fn test_download_entry_refuses_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = StubFetcher::default();

        let result = download_entry(&fetcher, &spec("cores/arduino/"), &Entry::new("../evil.h"), &prefix(&dir)).await;

        assert!(matches!(result, Err(MirrorError::UnsafeEntryName(_))));
        assert!(fetcher.requested().is_empty());
    }

    #[tokio::test]
    async fn test_download_entry_missing_destination() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        let fetcher = StubFetcher::default().file("cores/arduino/", "Print.h", b"class Print;");

        let result = download_entry(&fetcher, &spec("cores/arduino/"), &Entry::new("Print.h"), &prefix_of(&missing)).await;

        assert!(matches!(result, Err(MirrorError::Write { .. })));
    }

    #[tokio::test]
    async fn test_mirror_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = StubFetcher::default()
            .listing("cores/arduino/", &["A.c"])
            .file("cores/arduino/", "A.c", b"int main(){}")
            .listing("variants/standard/", &["B.h"])
            .file("variants/standard/", "B.h", b"#define X 1");

        let results = run(&fetcher, &["cores/arduino/", "variants/standard/"], &prefix(&dir))
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.success));
        assert_eq!(results[0].entry, Entry::new("A.c"));
        assert_eq!(results[1].entry, Entry::new("B.h"));
        assert_eq!(std::fs::read_to_string(dir.path().join("A.c")).unwrap(), "int main(){}");
        assert_eq!(std::fs::read_to_string(dir.path().join("B.h")).unwrap(), "#define X 1");
    }

    #[tokio::test]
    async fn test_mirror_same_name_last_write_wins() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = StubFetcher::default()
            .listing("cores/arduino/", &["pins_arduino.h"])
            .file("cores/arduino/", "pins_arduino.h", b"core version")
            .listing("variants/mega/", &["pins_arduino.h"])
            .file("variants/mega/", "pins_arduino.h", b"mega version");

        let results = run(&fetcher, &["cores/arduino/", "variants/mega/"], &prefix(&dir))
            .await
            .unwrap();

        // Both downloads are reported, but only one file exists
        assert_eq!(results.len(), 2);
        let files: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("pins_arduino.h")).unwrap(),
            "mega version"
        );
    }

    #[tokio::test]
    async fn test_mirror_stops_at_first_failed_download() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = StubFetcher::default()
            .listing("cores/arduino/", &["first.c", "second.c", "third.c"])
            .file("cores/arduino/", "first.c", b"1")
            .fail(&format!("{RAW}cores/arduino/second.c"), FetchError::Timeout)
            .file("cores/arduino/", "third.c", b"3")
            .listing("variants/standard/", &["pins_arduino.h"]);

        let failure = run(&fetcher, &["cores/arduino/", "variants/standard/"], &prefix(&dir))
            .await
            .unwrap_err();

        assert!(matches!(
            failure.error,
            MirrorError::Fetch { source: FetchError::Timeout, .. }
        ));

        // first.c succeeded, second.c is the recorded failure, nothing after it ran
        assert_eq!(failure.results.len(), 2);
        assert!(failure.results[0].success);
        assert_eq!(failure.results[1].entry, Entry::new("second.c"));
        assert!(!failure.results[1].success);

        assert_eq!(std::fs::read_to_string(dir.path().join("first.c")).unwrap(), "1");
        assert!(!dir.path().join("second.c").exists());
        assert!(!dir.path().join("third.c").exists());

        let requested = fetcher.requested();
        assert!(!requested.contains(&format!("{RAW}cores/arduino/third.c")));
        assert!(!requested.contains(&format!("{BROWSE}variants/standard/")));
    }

    #[tokio::test]
    async fn test_mirror_listing_failure_keeps_earlier_results() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = StubFetcher::default()
            .listing("cores/arduino/", &["Arduino.h"])
            .file("cores/arduino/", "Arduino.h", b"#pragma once");

        let failure = run(&fetcher, &["cores/arduino/", "variants/missing/"], &prefix(&dir))
            .await
            .unwrap_err();

        assert_eq!(failure.results.len(), 1);
        assert!(failure.results[0].success);
        assert!(matches!(failure.error, MirrorError::Fetch { .. }));
        assert!(dir.path().join("Arduino.h").exists());
    }

    #[tokio::test]
    async fn test_mirror_uses_config_paths() {
        let dir = tempfile::tempdir().unwrap();
        let config = MirrorConfig {
            browse_base_url: Url::parse(BROWSE).unwrap(),
            raw_base_url: Url::parse(RAW).unwrap(),
            core_path: "cores/arduino/".to_string(),
            variant_path: "variants/micro/".to_string(),
            dest_dir: prefix(&dir),
            selector: crate::listing::DEFAULT_SELECTOR.to_string(),
            timeout: std::time::Duration::from_secs(1),
        };
        let fetcher = StubFetcher::default()
            .listing("cores/arduino/", &[])
            .listing("variants/micro/", &["pins_arduino.h"])
            .file("variants/micro/", "pins_arduino.h", b"micro");

        let results = mirror(&fetcher, &SelectorListingParser::default(), &config)
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].local_path, dir.path().join("pins_arduino.h"));
    }

    #[tokio::test]
    async fn test_mirror_prepends_prefix_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = StubFetcher::default()
            .listing("cores/arduino/", &["A.c"])
            .file("cores/arduino/", "A.c", b"int main(){}");

        // No trailing separator: the prefix becomes part of the filename
        let mut dest = prefix(&dir);
        dest.push("out-");

        let results = run(&fetcher, &["cores/arduino/"], &dest).await.unwrap();

        assert_eq!(results.len(), 1);
        assert!(results[0].success);
        assert_eq!(results[0].local_path, dir.path().join("out-A.c"));
        assert_eq!(std::fs::read_to_string(dir.path().join("out-A.c")).unwrap(), "int main(){}");
        assert!(!dir.path().join("out-").exists());
    }
}
