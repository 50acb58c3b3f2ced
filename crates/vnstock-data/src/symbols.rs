//! 수집 대상 종목 목록.
//!
//! 입력 소스:
//! - 명령행 목록 (`--symbol ACV,VNM`)
//! - 파일 (한 줄에 하나, `#` 주석과 빈 줄 무시)
//! - 목록 페이지 스크래핑 (대문자 2~5글자 토큰)
//!
//! 모든 심볼은 대문자로 정규화되고, 처음 나온 순서를 유지한 채 중복이 제거됩니다.

use crate::error::SymbolError;
use scraper::{Html, Selector};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};
use vnstock_core::Symbol;

/// 목록 페이지에서 심볼 후보를 찾을 요소.
const LISTING_SELECTOR: &str = "td, a, span, li";

/// 검증된 종목 목록 (순서 유지, 중복 없음).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolRegistry {
    symbols: Vec<Symbol>,
}

impl SymbolRegistry {
    /// 심볼을 순서대로 추가합니다. 이미 있으면 무시.
    fn push_unique(&mut self, seen: &mut HashSet<Symbol>, symbol: Symbol) {
        if seen.insert(symbol.clone()) {
            self.symbols.push(symbol);
        }
    }

    fn from_lines<'a>(
        origin: &str,
        lines: impl Iterator<Item = &'a str>,
    ) -> Result<Self, SymbolError> {
        let mut registry = Self::default();
        let mut seen = HashSet::new();

        for (idx, line) in lines.enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            for token in line.split(',').map(str::trim).filter(|t| !t.is_empty()) {
                let symbol = Symbol::parse(token).map_err(|source| SymbolError::Invalid {
                    origin: origin.to_string(),
                    line: idx + 1,
                    source,
                })?;
                registry.push_unique(&mut seen, symbol);
            }
        }

        if registry.is_empty() {
            return Err(SymbolError::Empty(origin.to_string()));
        }
        Ok(registry)
    }

    /// 쉼표로 구분된 목록에서 생성합니다 (`"ACV, vnm"`).
    pub fn from_list(raw: &str) -> Result<Self, SymbolError> {
        Self::from_lines("--symbol", std::iter::once(raw))
    }

    /// 파일에서 읽습니다.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SymbolError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SymbolError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let registry = Self::from_lines(&path.display().to_string(), content.lines())?;
        debug!(path = %path.display(), count = registry.len(), "심볼 파일 로드");
        Ok(registry)
    }

    /// 명령행 목록과 파일을 합칩니다 (목록 먼저). 둘 다 없으면 에러.
    pub fn from_sources(list: Option<&str>, file: Option<&Path>) -> Result<Self, SymbolError> {
        let mut registry = Self::default();
        let mut seen = HashSet::new();

        let sources = [list.map(Self::from_list), file.map(Self::from_file)];
        for source in sources.into_iter().flatten() {
            for symbol in source?.symbols {
                registry.push_unique(&mut seen, symbol);
            }
        }

        if registry.is_empty() {
            return Err(SymbolError::Empty(
                "--symbol 또는 --symbols-file이 필요합니다".to_string(),
            ));
        }
        Ok(registry)
    }

    /// 종목 목록 페이지에서 심볼을 수집합니다 (정렬, 중복 제거).
    pub async fn fetch_from_page(url: &str, timeout: Duration) -> Result<Self, SymbolError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
            .build()
            .map_err(|e| SymbolError::Fetch(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| SymbolError::Fetch(format!("{}: {}", url, e)))?;
        let status = response.status();
        if !status.is_success() {
            return Err(SymbolError::Fetch(format!("{}: HTTP {}", url, status.as_u16())));
        }
        let html = response
            .text()
            .await
            .map_err(|e| SymbolError::Fetch(format!("{}: {}", url, e)))?;

        let registry = Self::from_listing_html(&html)?;
        if registry.is_empty() {
            return Err(SymbolError::Empty(url.to_string()));
        }
        info!(url, count = registry.len(), "목록 페이지에서 심볼 수집");
        Ok(registry)
    }

    /// 목록 HTML에서 대문자 2~5글자 토큰을 추출합니다.
    pub fn from_listing_html(html: &str) -> Result<Self, SymbolError> {
        let selector = Selector::parse(LISTING_SELECTOR)
            .map_err(|e| SymbolError::Fetch(format!("셀렉터 오류: {}", e)))?;
        let document = Html::parse_document(html);

        let tokens: BTreeSet<String> = document
            .select(&selector)
            .flat_map(|el| el.text().collect::<Vec<_>>())
            .flat_map(|text| text.split(|c: char| !c.is_ascii_alphanumeric()))
            .filter(|token| is_ticker_token(token))
            .map(str::to_string)
            .collect();

        let symbols = tokens
            .into_iter()
            .filter_map(|token| Symbol::parse(&token).ok())
            .collect();
        Ok(Self { symbols })
    }

    /// 심볼 슬라이스.
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// 종목 수.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// 비어 있는지.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// 순회.
    pub fn iter(&self) -> std::slice::Iter<'_, Symbol> {
        self.symbols.iter()
    }
}

impl<'a> IntoIterator for &'a SymbolRegistry {
    type Item = &'a Symbol;
    type IntoIter = std::slice::Iter<'a, Symbol>;

    fn into_iter(self) -> Self::IntoIter {
        self.symbols.iter()
    }
}

fn is_ticker_token(token: &str) -> bool {
    (2..=5).contains(&token.len()) && token.chars().all(|c| c.is_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn names(registry: &SymbolRegistry) -> Vec<&str> {
        registry.iter().map(Symbol::as_str).collect()
    }

    #[test]
    fn test_from_list_normalizes_and_dedups() {
        let registry = SymbolRegistry::from_list(" acv, VNM ,ACV,,fpt").unwrap();
        assert_eq!(names(&registry), vec!["ACV", "VNM", "FPT"]);
    }

    #[test]
    fn test_from_list_rejects_invalid_symbol() {
        let err = SymbolRegistry::from_list("ACV, VN-M").unwrap_err();
        assert!(matches!(err, SymbolError::Invalid { line: 1, .. }));
    }

    #[test]
    fn test_from_file_skips_comments_and_blank_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# HOSE").unwrap();
        writeln!(file, "ACV").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "vnm").unwrap();
        writeln!(file, "ACV").unwrap();

        let registry = SymbolRegistry::from_file(file.path()).unwrap();
        assert_eq!(names(&registry), vec!["ACV", "VNM"]);
    }

    #[test]
    fn test_from_file_reports_line_number() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "ACV").unwrap();
        writeln!(file, "TOOLONGSYMBOL").unwrap();

        let err = SymbolRegistry::from_file(file.path()).unwrap_err();
        assert!(matches!(err, SymbolError::Invalid { line: 2, .. }));
    }

    #[test]
    fn test_missing_or_empty_file() {
        assert!(matches!(
            SymbolRegistry::from_file("/nonexistent/symbols.txt"),
            Err(SymbolError::Io { .. })
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# nothing").unwrap();
        assert!(matches!(
            SymbolRegistry::from_file(file.path()),
            Err(SymbolError::Empty(_))
        ));
    }

    #[test]
    fn test_from_sources_merges_in_order() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "VNM\nHPG").unwrap();

        let registry = SymbolRegistry::from_sources(Some("ACV,VNM"), Some(file.path())).unwrap();
        assert_eq!(names(&registry), vec!["ACV", "VNM", "HPG"]);

        assert!(matches!(
            SymbolRegistry::from_sources(None, None),
            Err(SymbolError::Empty(_))
        ));
    }

    #[test]
    fn test_from_listing_html() {
        let html = r#"
            <table>
              <tr><td>ACV</td><td>Cảng hàng không</td></tr>
              <tr><td><a href="/vnm">VNM</a></td><td>Vinamilk</td></tr>
            </table>
            <ul><li>FPT - HOSE</li><li>TOOLONG</li><li>Hpg</li></ul>
            <p>SSI</p>
        "#;
        let registry = SymbolRegistry::from_listing_html(html).unwrap();
        assert_eq!(names(&registry), vec!["ACV", "FPT", "HOSE", "VNM"]);
    }

    #[tokio::test]
    async fn test_fetch_from_page() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/listing")
            .with_status(200)
            .with_body("<ul><li>VNM</li><li>ACV</li></ul>")
            .create_async()
            .await;

        let registry = SymbolRegistry::fetch_from_page(
            &format!("{}/listing", server.url()),
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        assert_eq!(names(&registry), vec!["ACV", "VNM"]);
    }
}
