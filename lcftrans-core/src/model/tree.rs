use indexmap::IndexMap;
use serde_json::Value;

/// Field name of a raw byte-string leaf in a decoder dump: `{"$bytes": "<hex>"}`.
pub const BYTES_KEY: &str = "$bytes";

/// Game data as handed over by the external decoder.
#[derive(Debug, Clone, PartialEq)]
pub enum DataNode {
    Map(IndexMap<String, DataNode>),
    List(Vec<DataNode>),
    /// Raw text bytes, still in the game's encoding.
    Text(Vec<u8>),
    Int(i64),
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeKind {
    Database,
    MapTree,
    Map,
}

impl DataNode {
    pub fn from_json(value: Value) -> Result<Self, String> {
        Ok(match value {
            Value::Object(obj) => {
                if obj.len() == 1 {
                    if let Some(Value::String(h)) = obj.get(BYTES_KEY) {
                        let bytes = hex::decode(h).map_err(|e| format!("bad {BYTES_KEY} leaf: {e}"))?;
                        return Ok(DataNode::Text(bytes));
                    }
                }

                let mut map = IndexMap::with_capacity(obj.len());
                for (k, v) in obj {
                    map.insert(k, DataNode::from_json(v)?);
                }
                DataNode::Map(map)
            }
            Value::Array(arr) => DataNode::List(
                arr.into_iter()
                    .map(DataNode::from_json)
                    .collect::<Result<_, _>>()?,
            ),
            Value::String(s) => DataNode::Text(s.into_bytes()),
            Value::Number(n) => match n.as_i64() {
                Some(i) => DataNode::Int(i),
                None => DataNode::Other,
            },
            Value::Bool(_) | Value::Null => DataNode::Other,
        })
    }

    pub fn get(&self, field: &str) -> Option<&DataNode> {
        match self {
            DataNode::Map(m) => m.get(field),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            DataNode::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            DataNode::Text(b) => Some(b),
            _ => None,
        }
    }

    /// Calls `visit` with the path and raw bytes of every text leaf, depth
    /// first in document order.
    pub fn for_each_text_leaf<F>(&self, mut visit: F)
    where
        F: FnMut(&[String], &[u8]),
    {
        let mut path = Vec::new();
        self.walk_leaves(&mut path, &mut visit);
    }

    fn walk_leaves<F>(&self, path: &mut Vec<String>, visit: &mut F)
    where
        F: FnMut(&[String], &[u8]),
    {
        match self {
            DataNode::Map(m) => {
                for (k, v) in m {
                    path.push(k.clone());
                    v.walk_leaves(path, visit);
                    path.pop();
                }
            }
            DataNode::List(items) => {
                for (i, v) in items.iter().enumerate() {
                    path.push(i.to_string());
                    v.walk_leaves(path, visit);
                    path.pop();
                }
            }
            DataNode::Text(bytes) => visit(path, bytes),
            DataNode::Int(_) | DataNode::Other => {}
        }
    }
}
