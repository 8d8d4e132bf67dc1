//! In-page scripts evaluated by [`crate::ChromiumDriver`].
//!
//! Element handles are structural `nth-child` paths so that probing never
//! has to tag the DOM.

use serde::Serialize;

use crate::error::{AdapterError, AdapterErrorKind};
use crate::types::ElementQuery;

const PROBE_FN: &str = r#"(query) => {
  const INTERACTIVE = 'button, [role="button"], a[href], input, textarea, select, [contenteditable="true"], [role="textbox"], [role="link"], [role="menuitem"]';
  const lower = (v) => (v || '').toString().toLowerCase();
  const matchesAny = (value, patterns) => {
    const hay = lower(value);
    return !!hay && patterns.some((p) => hay.includes(lower(p)));
  };
  const implicitRole = (el) => {
    const explicit = el.getAttribute('role');
    if (explicit) return explicit;
    const tag = el.tagName.toLowerCase();
    if (tag === 'button') return 'button';
    if (tag === 'a' && el.hasAttribute('href')) return 'link';
    if (tag === 'textarea') return 'textbox';
    if (tag === 'input') {
      const type = lower(el.getAttribute('type') || 'text');
      if (['button', 'submit', 'reset'].includes(type)) return 'button';
      if (['checkbox', 'radio'].includes(type)) return type;
      return 'textbox';
    }
    if (el.isContentEditable) return 'textbox';
    return null;
  };
  const accessibleName = (el) => {
    const label = el.getAttribute('aria-label');
    if (label) return label.trim();
    const labelledBy = el.getAttribute('aria-labelledby');
    if (labelledBy) {
      const ref = document.getElementById(labelledBy);
      if (ref) return (ref.textContent || '').trim();
    }
    const svg = el.querySelector ? el.querySelector('svg[aria-label]') : null;
    if (svg) return (svg.getAttribute('aria-label') || '').trim();
    const text = (el.innerText || el.textContent || '').trim();
    if (text) return text;
    return (el.getAttribute('placeholder') || el.getAttribute('title') || el.value || '').toString().trim();
  };
  const pathOf = (el) => {
    const parts = [];
    let node = el;
    while (node && node.nodeType === 1 && node !== document.documentElement) {
      const parent = node.parentElement;
      if (!parent) break;
      const index = Array.prototype.indexOf.call(parent.children, node) + 1;
      parts.unshift(node.tagName.toLowerCase() + ':nth-child(' + index + ')');
      node = parent;
    }
    return parts.length ? 'html > ' + parts.join(' > ') : 'html';
  };
  const describe = (el) => {
    const rect = el.getBoundingClientRect();
    const style = window.getComputedStyle(el);
    const visible = rect.width > 0 && rect.height > 0 && style.visibility !== 'hidden'
      && style.display !== 'none' && parseFloat(style.opacity || '1') > 0;
    const vw = window.innerWidth || document.documentElement.clientWidth;
    const vh = window.innerHeight || document.documentElement.clientHeight;
    const tag = el.tagName.toLowerCase();
    const editable = !!el.isContentEditable || tag === 'input' || tag === 'textarea';
    const value = el.isContentEditable ? (el.innerText || '') : (el.value || '');
    return {
      handle: pathOf(el),
      tag,
      role: implicitRole(el),
      name: accessibleName(el).slice(0, 200),
      text: (el.innerText || el.textContent || '').trim().slice(0, 200),
      ariaLabel: el.getAttribute('aria-label'),
      placeholder: el.getAttribute('placeholder') || el.getAttribute('aria-placeholder') || el.getAttribute('data-placeholder'),
      rect: { x: rect.x, y: rect.y, width: rect.width, height: rect.height },
      visible,
      disabled: !!(el.disabled || el.getAttribute('aria-disabled') === 'true'),
      inViewport: rect.bottom > 0 && rect.right > 0 && rect.top < vh && rect.left < vw,
      editable,
      valueLen: value.toString().trim().length,
    };
  };
  const safeAll = (selector) => {
    try { return Array.from(document.querySelectorAll(selector)); } catch (e) { return []; }
  };
  let elements = [];
  if (query.mode === 'role') {
    elements = safeAll('body *').filter((el) => implicitRole(el) === query.role && matchesAny(accessibleName(el), query.names));
  } else if (query.mode === 'text') {
    const seen = new Set();
    for (const el of safeAll('body *')) {
      const attrs = [el.getAttribute('placeholder'), el.getAttribute('aria-placeholder'), el.getAttribute('aria-label')];
      let hit = attrs.some((v) => v && matchesAny(v, query.patterns));
      if (!hit) {
        const text = (el.innerText || '').trim();
        if (text && text.length <= 200 && matchesAny(text, query.patterns)) {
          hit = !Array.from(el.children).some((child) => matchesAny(child.innerText || '', query.patterns));
        }
      }
      if (!hit) continue;
      const target = el.closest(INTERACTIVE) || el;
      if (seen.has(target)) continue;
      seen.add(target);
      elements.push(target);
    }
  } else if (query.mode === 'css') {
    elements = safeAll(query.selector);
  } else if (query.mode === 'interactive') {
    const pool = query.pool && query.pool.length ? query.pool.join(', ') : INTERACTIVE;
    elements = safeAll(pool);
  }
  return elements.slice(0, 200).map(describe);
}"#;

const CENTER_FN: &str = r#"(handle) => {
  const el = document.querySelector(handle);
  if (!el) return null;
  el.scrollIntoView({ block: 'center', inline: 'center' });
  const r = el.getBoundingClientRect();
  return { x: r.x + r.width / 2, y: r.y + r.height / 2 };
}"#;

const CLEAR_FN: &str = r#"(handle) => {
  const el = document.querySelector(handle);
  if (!el) return false;
  el.focus();
  if (el.isContentEditable) {
    const selection = window.getSelection();
    const range = document.createRange();
    range.selectNodeContents(el);
    selection.removeAllRanges();
    selection.addRange(range);
    document.execCommand('delete');
  } else if ('value' in el) {
    el.value = '';
    el.dispatchEvent(new Event('input', { bubbles: true }));
  }
  return true;
}"#;

pub const PAGE_TEXT: &str = "document.body ? document.body.innerText : ''";

fn invoke<T: Serialize + ?Sized>(function: &str, argument: &T) -> Result<String, AdapterError> {
    let literal = serde_json::to_string(argument)
        .map_err(|err| AdapterError::new(AdapterErrorKind::Internal).with_hint(err.to_string()))?;
    Ok(format!("({function})({literal})"))
}

pub fn probe(query: &ElementQuery) -> Result<String, AdapterError> {
    invoke(PROBE_FN, query)
}

pub fn center(handle: &str) -> Result<String, AdapterError> {
    invoke(CENTER_FN, handle)
}

pub fn clear(handle: &str) -> Result<String, AdapterError> {
    invoke(CLEAR_FN, handle)
}
