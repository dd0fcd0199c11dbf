//! Ansible play and task structures.
//!
//! A task is a name, one module invocation and an optional `when` guard.
//! The module key varies per task, so `Task` serializes itself as a mapping
//! instead of deriving.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_yaml::{Mapping, Value};

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Play {
    pub name: String,
    pub hosts: String,
    pub gather_facts: bool,
    #[serde(rename = "become")]
    pub escalate: bool,
    #[serde(skip_serializing_if = "Mapping::is_empty")]
    pub vars: Mapping,
    pub tasks: Vec<Task>,
}

impl Play {
    pub fn new(name: impl Into<String>, hosts: impl Into<String>) -> Self {
        Play {
            name: name.into(),
            hosts: hosts.into(),
            gather_facts: false,
            escalate: false,
            vars: Mapping::new(),
            tasks: Vec::new(),
        }
    }

    pub fn gather_facts(mut self) -> Self {
        self.gather_facts = true;
        self
    }

    pub fn escalate(mut self) -> Self {
        self.escalate = true;
        self
    }

    pub fn var(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.vars.insert(Value::from(key), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub name: String,
    pub module: String,
    pub args: Mapping,
    pub when: Option<String>,
}

impl Task {
    pub fn new(name: impl Into<String>, module: impl Into<String>) -> Self {
        Task {
            name: name.into(),
            module: module.into(),
            args: Mapping::new(),
            when: None,
        }
    }

    pub fn arg(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.args.insert(Value::from(key), value.into());
        self
    }

    pub fn when(mut self, condition: impl Into<String>) -> Self {
        self.when = Some(condition.into());
        self
    }
}

impl Serialize for Task {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.when.is_some() { 3 } else { 2 };
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry(&self.module, &self.args)?;
        if let Some(when) = &self.when {
            map.serialize_entry("when", when)?;
        }
        map.end()
    }
}

/// Sequence value from string items
pub fn list<I, S>(items: I) -> Value
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Value::Sequence(items.into_iter().map(|item| Value::String(item.into())).collect())
}

/// `when` guard limiting a task to one inventory host
pub fn only_on(host: &str) -> String {
    format!("inventory_hostname == '{}'", host)
}
