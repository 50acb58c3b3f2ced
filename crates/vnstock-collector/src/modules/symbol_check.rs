//! 종목 목록 확인 모듈.

use crate::Result;
use std::path::Path;
use std::time::Duration;
use vnstock_data::SymbolRegistry;

/// 종목 목록 출처
#[derive(Debug, Clone)]
pub enum SymbolSource<'a> {
    /// 로컬 파일
    File(&'a Path),
    /// 목록 페이지 URL
    Url(&'a str),
}

/// 종목 목록을 읽어 검증합니다. 비어 있거나 읽을 수 없으면 에러.
pub async fn load_symbols(source: SymbolSource<'_>, timeout: Duration) -> Result<SymbolRegistry> {
    let registry = match source {
        SymbolSource::File(path) => SymbolRegistry::from_file(path)?,
        SymbolSource::Url(url) => SymbolRegistry::fetch_from_page(url, timeout).await?,
    };
    tracing::info!(count = registry.len(), "종목 목록 확인 완료");
    Ok(registry)
}

/// 한 줄에 하나씩 출력할 텍스트.
pub fn render_symbols(registry: &SymbolRegistry) -> String {
    registry
        .iter()
        .map(|symbol| format!("{}\n", symbol))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CollectorError;
    use std::io::Write;

    #[tokio::test]
    async fn test_load_and_render_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "acv\n# comment\nVNM").unwrap();

        let registry = load_symbols(SymbolSource::File(file.path()), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(render_symbols(&registry), "ACV\nVNM\n");
    }

    #[tokio::test]
    async fn test_missing_file_is_error() {
        let result = load_symbols(
            SymbolSource::File(Path::new("/nonexistent/symbols.txt")),
            Duration::from_secs(1),
        )
        .await;
        assert!(matches!(result, Err(CollectorError::Symbols(_))));
    }
}
