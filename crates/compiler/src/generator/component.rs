//! 수집기 컴포넌트 빌더
//!
//! 컴포넌트는 `type`, `inputs`와 유형별 키를 가진 TOML 테이블입니다.
//! 키 경로(`request.headers`)는 중첩 테이블로 펼쳐집니다.

use toml::{Table, Value};

/// 컴포넌트 테이블 빌더
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Component {
    table: Table,
}

impl Component {
    /// 입력이 없는 컴포넌트 (소스)
    pub fn source(kind: &str) -> Self {
        let mut table = Table::new();
        table.insert("type".to_owned(), Value::from(kind));
        Self { table }
    }

    /// 입력을 받는 컴포넌트 (트랜스폼, 싱크)
    pub fn new(kind: &str, inputs: &[String]) -> Self {
        Self::source(kind).set("inputs", string_array(inputs))
    }

    /// 점으로 구분한 키 경로에 값을 넣습니다.
    pub fn set(self, path: &str, value: impl Into<Value>) -> Self {
        let segments: Vec<&str> = path.split('.').collect();
        self.set_at(&segments, value)
    }

    /// 세그먼트 경로에 값을 넣습니다. 세그먼트 안의 `.`은 그대로 키가 됩니다.
    pub fn set_at(mut self, segments: &[&str], value: impl Into<Value>) -> Self {
        insert_at(&mut self.table, segments, value.into());
        self
    }

    /// `Some`일 때만 값을 넣습니다.
    pub fn set_opt<V: Into<Value>>(self, path: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.set(path, value),
            None => self,
        }
    }

    /// 테이블을 경로 아래로 병합합니다.
    pub fn merge(mut self, path: &str, table: Table) -> Self {
        let segments: Vec<&str> = path.split('.').collect();
        for (key, value) in table {
            let mut full = segments.clone();
            full.push(&key);
            insert_at(&mut self.table, &full, value);
        }
        self
    }

    /// 경로의 값을 조회합니다 (테스트/검사용).
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        segments.try_fold(self.table.get(first)?, |value, key| value.get(key))
    }

    pub fn into_table(self) -> Table {
        self.table
    }
}

fn insert_at(table: &mut Table, segments: &[&str], value: Value) {
    let Some((last, parents)) = segments.split_last() else {
        return;
    };
    let mut current = table;
    for key in parents {
        let entry = current
            .entry((*key).to_owned())
            .or_insert_with(|| Value::Table(Table::new()));
        if !entry.is_table() {
            *entry = Value::Table(Table::new());
        }
        let Value::Table(next) = entry else {
            return;
        };
        current = next;
    }
    current.insert((*last).to_owned(), value);
}

/// 문자열 배열 값
pub fn string_array<S: AsRef<str>>(items: &[S]) -> Value {
    Value::Array(items.iter().map(|s| Value::from(s.as_ref())).collect())
}

/// 부호 없는 정수 값 (`i64` 범위로 포화)
pub fn integer(value: u64) -> Value {
    Value::Integer(i64::try_from(value).unwrap_or(i64::MAX))
}
