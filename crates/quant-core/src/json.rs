//! JSON 파일 입출력.
//!
//! 모든 산출물은 전체 쓰기(임시 파일 후 rename)로 저장합니다.
//! 중간에 중단되어도 유효해 보이는 반쪽짜리 파일이 남지 않습니다.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// JSON 입출력 오류.
#[derive(Debug, Error)]
pub enum JsonError {
    #[error("파일 입출력 오류: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON 직렬화/역직렬화 오류: {0}")]
    Serde(#[from] serde_json::Error),
}

/// JSON 파일을 읽어 역직렬화합니다.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, JsonError> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// 값을 JSON으로 직렬화하여 전체 쓰기로 저장합니다.
///
/// 부모 디렉터리가 없으면 만들고, 같은 디렉터리의 임시 파일에 쓴 뒤
/// rename으로 교체합니다.
pub fn dump_json<T: Serialize>(value: &T, path: &Path) -> Result<(), JsonError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let bytes = serde_json::to_vec_pretty(value)?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    fs::write(&tmp, &bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn dump_then_load_round_trips() {
        let dir = std::env::temp_dir().join("quant-core-json-test");
        let path = dir.join("nested/values.json");
        let mut values = BTreeMap::new();
        values.insert("a".to_string(), 1u64);
        values.insert("b".to_string(), 2u64);

        dump_json(&values, &path).unwrap();
        let loaded: BTreeMap<String, u64> = load_json(&path).unwrap();
        assert_eq!(loaded, values);

        fs::remove_dir_all(&dir).ok();
    }
}
