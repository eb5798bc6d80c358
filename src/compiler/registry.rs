use crate::graph::WorkflowNode;
use crate::reference::js_string;
use ahash::AHashMap;
use serde_json::Value;

/// Everything a generator needs to emit the function for one node.
pub struct GeneratorInput<'a> {
    pub node: &'a WorkflowNode,
    /// The normalized operation key the generator was looked up by.
    pub key: &'a str,
    /// The node's prepared configuration. Strings may be reference placeholders.
    pub config: &'a Value,
}

/// Defines the contract for turning a node of one operation into script source.
///
/// `generate` returns the *body* of a `function (ctx) { ... }` that must return the
/// next context. Embed configuration with [`config_literal`] so that reference
/// placeholders stay inside string literals and get resolved after assembly.
pub trait NodeGenerator: Send + Sync {
    fn operation_key(&self) -> &str;
    fn generate(&self, input: &GeneratorInput<'_>) -> String;
}

/// Renders a configuration value as a script literal.
pub fn config_literal(value: &Value) -> String {
    value.to_string()
}

/// Derives the normalized operation key of a node.
///
/// Priority: `op`, then `app` + `data.operation`, then the node `type`.
pub fn operation_key(node: &WorkflowNode) -> Option<String> {
    fn non_empty(s: Option<&str>) -> Option<&str> {
        s.map(str::trim).filter(|s| !s.is_empty())
    }
    let raw = match (
        non_empty(node.op.as_deref()),
        non_empty(node.app.as_deref()),
        non_empty(node.operation()),
    ) {
        (Some(op), _, _) => op.to_string(),
        (None, Some(app), Some(operation)) => format!("{}.{}", app, operation),
        (None, None, Some(operation)) => operation.to_string(),
        (None, Some(app), None) => app.to_string(),
        (None, None, None) => non_empty(Some(node.node_type.as_str()))?.to_string(),
    };
    Some(normalize_key(&raw))
}

pub fn normalize_key(raw: &str) -> String {
    raw.trim()
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c == ':' || c == '/' { '.' } else { c })
        .collect()
}

/// Keyed lookup of generators, with the fallback generator as the default entry.
pub struct GeneratorRegistry {
    generators: AHashMap<String, Box<dyn NodeGenerator>>,
    fallback: Box<dyn NodeGenerator>,
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        let mut registry = Self {
            generators: AHashMap::new(),
            fallback: Box::new(FallbackGenerator),
        };
        register_default_generators(&mut registry.generators);
        registry
    }
}

impl GeneratorRegistry {
    pub fn register(&mut self, generator: Box<dyn NodeGenerator>) {
        let key = normalize_key(generator.operation_key());
        self.generators.insert(key, generator);
    }

    /// Maps a user-facing key onto a built-in generator. Returns `false` if the
    /// built-in does not exist.
    pub fn alias(&mut self, user_key: &str, builtin_key: &str) -> bool {
        match create_generator_by_name(&normalize_key(builtin_key)) {
            Some(generator) => {
                self.generators.insert(normalize_key(user_key), generator);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, key: &str) -> Option<&dyn NodeGenerator> {
        self.generators.get(key).map(Box::as_ref)
    }

    pub fn fallback(&self) -> &dyn NodeGenerator {
        self.fallback.as_ref()
    }
}

/// Generator for operations with no registered entry.
///
/// Logs the operation and the incoming context, then tags the context so the
/// unimplemented step is visible in the final result.
struct FallbackGenerator;

impl NodeGenerator for FallbackGenerator {
    fn operation_key(&self) -> &str {
        "*"
    }

    fn generate(&self, input: &GeneratorInput<'_>) -> String {
        let key = js_string(input.key);
        format!(
            "  __flowLog('Unimplemented operation ' + {key} + ' on node ' + {node}, ctx);\n  \
             return __flowAssign(ctx, {{ __unimplemented: {key} }});\n",
            node = js_string(&input.node.id),
        )
    }
}

/// Master macro to define built-in generators, their registration, and creation by name.
macro_rules! define_node_generators {
    ( $( ($struct_name:ident, $key:literal, $body:ident) ),* $(,)? ) => {
        $(
            struct $struct_name;
            impl NodeGenerator for $struct_name {
                fn operation_key(&self) -> &str { $key }
                fn generate(&self, input: &GeneratorInput<'_>) -> String { $body(input) }
            }
        )*

        fn register_default_generators(registry: &mut AHashMap<String, Box<dyn NodeGenerator>>) {
            $( registry.insert($key.to_string(), Box::new($struct_name)); )*
        }

        fn create_generator_by_name(name: &str) -> Option<Box<dyn NodeGenerator>> {
            match name {
                $( $key => Some(Box::new($struct_name)), )*
                _ => None,
            }
        }
    };
}

define_node_generators! {
    (TriggerGenerator, "trigger", passthrough_body),
    (NoopGenerator, "core.noop", passthrough_body),
    (SetGenerator, "core.set", set_body),
    (LogGenerator, "core.log", log_body),
    (HttpRequestGenerator, "http.request", http_request_body),
}

fn passthrough_body(_input: &GeneratorInput<'_>) -> String {
    "  return ctx || {};\n".to_string()
}

/// Merges `config.values` (or the whole config) into the context.
fn set_body(input: &GeneratorInput<'_>) -> String {
    let values = input.config.get("values").unwrap_or(input.config);
    format!(
        "  var values = {};\n  return __flowAssign(ctx, values);\n",
        config_literal(values)
    )
}

fn log_body(input: &GeneratorInput<'_>) -> String {
    let message = input.config.get("message").unwrap_or(&Value::Null);
    format!(
        "  var message = {};\n  \
         __flowLog({} + (message === null || message === undefined ? '' : String(message)), ctx);\n  \
         return ctx;\n",
        config_literal(message),
        js_string(&format!("[{}] ", input.node.id)),
    )
}

fn http_request_body(input: &GeneratorInput<'_>) -> String {
    format!(
        r#"  var request = {config};
  var options = {{ method: String(request.method || 'get').toLowerCase(), muteHttpExceptions: true }};
  if (request.headers) options.headers = request.headers;
  if (request.body !== undefined && request.body !== null) {{
    options.payload = typeof request.body === 'string' ? request.body : JSON.stringify(request.body);
    options.contentType = request.contentType || 'application/json';
  }}
  try {{
    var response = UrlFetchApp.fetch(String(request.url), options);
    var text = response.getContentText();
    var body = text;
    try {{ body = JSON.parse(text); }} catch (parseError) {{}}
    return __flowAssign(ctx, {{ response: {{ status: response.getResponseCode(), body: body }} }});
  }} catch (e) {{
    return __flowAssign(ctx, {{ error: {{ nodeId: {node}, message: String(e && e.message ? e.message : e) }} }});
  }}
"#,
        config = config_literal(input.config),
        node = js_string(&input.node.id),
    )
}
