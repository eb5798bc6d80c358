//! Helper library prepended to every generated script.
//!
//! The target host runs plain synchronous functions, so everything the compiled
//! workflow needs at runtime (node output storage, reference lookup, activation
//! state, rule evaluation) is emitted as ordinary top-level functions.
//!
//! Per-node activation state is a small state machine:
//! `undefined` (pending) -> `'active'` -> `'done'`. A node that is `done` is never
//! re-activated, so a block can run at most once per invocation.

/// Helper library text. Every helper name starts with `__flow`.
pub const RUNTIME_HELPERS: &str = r#"var __flowOutputs = {};
var __flowState = {};

function __flowLog(message, data) {
  var text = String(message);
  if (data !== undefined) {
    try {
      text += ' ' + JSON.stringify(data);
    } catch (e) {
      text += ' ' + String(data);
    }
  }
  if (typeof Logger !== 'undefined' && Logger.log) {
    Logger.log(text);
  } else if (typeof console !== 'undefined' && console.log) {
    console.log(text);
  }
}

function __flowAssign(target, extra) {
  var out = {};
  var key;
  if (target !== null && typeof target === 'object') {
    for (key in target) {
      if (Object.prototype.hasOwnProperty.call(target, key)) out[key] = target[key];
    }
  } else if (target !== undefined && target !== null) {
    out.value = target;
  }
  if (extra !== null && typeof extra === 'object') {
    for (key in extra) {
      if (Object.prototype.hasOwnProperty.call(extra, key)) out[key] = extra[key];
    }
  }
  return out;
}

function __flowStore(nodeId, value) {
  var snapshot = value;
  try {
    snapshot = JSON.parse(JSON.stringify(value));
  } catch (e) {
    snapshot = value;
  }
  __flowOutputs[nodeId] = snapshot;
  return value;
}

function __flowLookup(nodeId, path) {
  if (!Object.prototype.hasOwnProperty.call(__flowOutputs, nodeId)) return undefined;
  var current = __flowOutputs[nodeId];
  var normalized = path === undefined || path === null ? '' : String(path).replace(/^\$\.?/, '');
  if (normalized === '') return current;
  var segments = normalized.split('.');
  for (var i = 0; i < segments.length; i++) {
    if (segments[i] === '') continue;
    if (current === null || current === undefined) return undefined;
    if (Array.isArray(current) && /^\d+$/.test(segments[i])) {
      current = current[Number(segments[i])];
    } else {
      current = current[segments[i]];
    }
  }
  return current;
}

function __flowActivate(nodeId) {
  if (__flowState[nodeId] !== 'done') __flowState[nodeId] = 'active';
}

function __flowBranchKey(value) {
  if (typeof value === 'string') {
    var text = value.trim().toLowerCase();
    if (text === 'true' || text === 'yes' || text === '1' || text === 'y') return 'true';
    if (text === 'false' || text === 'no' || text === '0' || text === 'n' || text === '') return 'false';
  }
  return value ? 'true' : 'false';
}

function __flowEvaluateRule(rule, ctx) {
  if (rule !== null && typeof rule === 'object' && !Array.isArray(rule) &&
      Object.prototype.hasOwnProperty.call(rule, 'value')) {
    return __flowEvaluateRule(rule.value, ctx);
  }
  if (typeof rule === 'number') return rule !== 0 && !isNaN(rule);
  if (typeof rule !== 'string') return !!rule;
  var text = rule.trim();
  var lowered = text.toLowerCase();
  if (lowered === 'true' || lowered === 'yes' || lowered === '1' || lowered === 'y') return true;
  if (lowered === 'false' || lowered === 'no' || lowered === '0' || lowered === 'n' || text === '') return false;
  return (new Function('ctx', 'return (' + text + ');'))(ctx);
}

function __flowFail(ctx, nodeId, error) {
  var message = String(error && error.message ? error.message : error);
  __flowLog('Node ' + nodeId + ' failed: ' + message);
  var failure = { nodeId: nodeId, message: message };
  var errors = ctx && Array.isArray(ctx.errors) ? ctx.errors.slice() : [];
  errors.push(failure);
  return __flowAssign(ctx, { lastError: failure, errors: errors });
}
"#;
