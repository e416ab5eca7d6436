//! The inspector runtime shipped inside every rewritten page.
//!
//! The script builds one session object per document, announces itself with
//! `picker-ready`, and only starts picking when the parent frame sends
//! `toggle-picker`. Selector tiers and style extraction follow
//! [`crate::inspector`] step for step.

/// Attribute marking the injected block, used to detect double injection
pub const RUNTIME_MARKER: &str = "data-pagepick-runtime";

pub const INSPECTOR_SCRIPT: &str = r#"
(function () {
  'use strict';
  if (window.__pagepickSession) { return; }

  const INTERACTIVE_WORDS = ['btn', 'button', 'cta', 'primary', 'action'];
  const CTA_TEXT = /\b(get started|start|try|sign ?up|register|join|buy|order|shop|download|subscribe|book|get|claim|request|contact|learn more|add to cart|checkout|donate)\b/i;
  const CTA_TEXT_WINDOW = 80;
  const MAX_CLASS_LEN = 24;
  const MAX_CLASSES = 2;
  const ANCESTOR_DEPTH = 4;
  const PATH_DEPTH = 10;

  // ---- selector helpers ----

  function esc(ident) {
    if (window.CSS && typeof CSS.escape === 'function') { return CSS.escape(ident); }
    return String(ident).replace(/[^\w-]/g, function (c) { return '\\' + c; });
  }

  function isUnique(selector) {
    try {
      return document.querySelectorAll(selector).length === 1;
    } catch (e) {
      return false;
    }
  }

  function isHashy(c) {
    return c.indexOf('__') !== -1 ||
      c.indexOf('--') !== -1 ||
      /\d/.test(c) ||
      (c.match(/\p{Lu}/gu) || []).length >= 2 ||
      Array.from(c).length > MAX_CLASS_LEN;
  }

  function classesOf(el) {
    return Array.prototype.slice.call(el.classList || []);
  }

  function semanticClasses(el) {
    return classesOf(el)
      .filter(function (c) { return !isHashy(c); })
      .sort(function (a, b) { return Array.from(a).length - Array.from(b).length; })
      .slice(0, MAX_CLASSES);
  }

  function tagOf(el) {
    return (el.localName || el.tagName || '').toLowerCase();
  }

  function idOf(el) {
    const id = el.getAttribute && el.getAttribute('id');
    return id ? id : null;
  }

  function baseForm(el) {
    return tagOf(el) + semanticClasses(el).map(function (c) { return '.' + esc(c); }).join('');
  }

  function sameTagSiblings(el) {
    const parent = el.parentElement;
    if (!parent) { return []; }
    return Array.prototype.filter.call(parent.children, function (s) {
      return s.localName === el.localName;
    });
  }

  function nthOfType(el) {
    return sameTagSiblings(el).indexOf(el) + 1;
  }

  function identity(el) {
    const id = idOf(el);
    if (!id) { return null; }
    const selector = '#' + esc(id);
    return isUnique(selector) ? selector : null;
  }

  function structural(el) {
    const base = baseForm(el);
    if (isUnique(base)) { return base; }
    const positional = base + ':nth-of-type(' + nthOfType(el) + ')';
    if (isUnique(positional)) { return positional; }

    let ancestor = el.parentElement;
    for (let depth = 0; ancestor && depth < ANCESTOR_DEPTH; depth++) {
      const scope = identity(ancestor) || baseForm(ancestor);
      const candidates = [scope + ' ' + base, scope + ' ' + positional];
      for (let i = 0; i < candidates.length; i++) {
        if (isUnique(candidates[i])) { return candidates[i]; }
      }
      ancestor = ancestor.parentElement;
    }
    return null;
  }

  function readablePath(el) {
    const segments = [];
    let node = el;
    while (node && node.nodeType === 1 && segments.length < PATH_DEPTH) {
      const tag = tagOf(node);
      if (tag === 'html') { break; }
      const id = idOf(node);
      let segment = tag;
      if (id) { segment += '#' + esc(id); }
      semanticClasses(node).forEach(function (c) { segment += '.' + esc(c); });
      if (!id && sameTagSiblings(node).length > 1) {
        segment += ':nth-of-type(' + nthOfType(node) + ')';
      }
      segments.push(segment);
      if (id) { break; }
      node = node.parentElement;
    }
    return segments.length ? segments.reverse().join(' > ') : tagOf(el);
  }

  function splitCompounds(selector) {
    const out = [];
    let current = '';
    let pending = null;
    let depth = 0;
    for (let i = 0; i < selector.length; i++) {
      const c = selector[i];
      if (c === '\\') {
        current += c;
        const next = selector[i + 1];
        if (next !== undefined && /[0-9a-fA-F]/.test(next)) {
          let digits = 0;
          while (digits < 6 && selector[i + 1] !== undefined && /[0-9a-fA-F]/.test(selector[i + 1])) {
            current += selector[++i];
            digits++;
          }
          if (selector[i + 1] === ' ') { current += selector[++i]; }
        } else if (next !== undefined) {
          current += selector[++i];
        }
      } else if (c === '(' || c === '[') {
        depth++;
        current += c;
      } else if (c === ')' || c === ']') {
        depth = Math.max(0, depth - 1);
        current += c;
      } else if (depth === 0 && (/\s/.test(c) || c === '>' || c === '+' || c === '~')) {
        if (current) {
          out.push([pending, current]);
          pending = null;
          current = '';
        }
        if (!/\s/.test(c)) {
          pending = c;
        } else if (pending === null && out.length) {
          pending = ' ';
        }
      } else {
        current += c;
      }
    }
    if (current) { out.push([pending, current]); }
    return out;
  }

  function pretty(selector) {
    return splitCompounds(selector).map(function (part, depth) {
      const indent = '  '.repeat(depth);
      return part[0] && part[0] !== ' ' ? indent + part[0] + ' ' + part[1] : indent + part[1];
    }).join('\n');
  }

  // ---- computed style snapshot ----

  function snapshot(el) {
    const s = window.getComputedStyle(el);
    const sides = function (prefix) {
      return {
        top: s[prefix + 'Top'], right: s[prefix + 'Right'],
        bottom: s[prefix + 'Bottom'], left: s[prefix + 'Left']
      };
    };
    const edge = function (side) {
      return {
        width: s['border' + side + 'Width'],
        style: s['border' + side + 'Style'],
        color: s['border' + side + 'Color']
      };
    };
    return {
      display: s.display, position: s.position, overflow: s.overflow,
      cursor: s.cursor, transition: s.transition, boxShadow: s.boxShadow,
      opacity: s.opacity, color: s.color, backgroundColor: s.backgroundColor,
      fontFamily: s.fontFamily, fontSize: s.fontSize, fontWeight: s.fontWeight,
      lineHeight: s.lineHeight, letterSpacing: s.letterSpacing,
      textAlign: s.textAlign, textTransform: s.textTransform,
      textDecorationLine: s.textDecorationLine,
      margin: sides('margin'),
      padding: sides('padding'),
      border: { top: edge('Top'), right: edge('Right'), bottom: edge('Bottom'), left: edge('Left') },
      borderRadius: {
        topLeft: s.borderTopLeftRadius, topRight: s.borderTopRightRadius,
        bottomRight: s.borderBottomRightRadius, bottomLeft: s.borderBottomLeftRadius
      },
      flexDirection: s.flexDirection, justifyContent: s.justifyContent,
      alignItems: s.alignItems, gap: s.gap
    };
  }

  // ---- colors and lengths ----

  function parseColor(value) {
    const v = String(value || '').trim().toLowerCase();
    if (v === 'transparent') { return { r: 0, g: 0, b: 0, a: 0 }; }
    const m = /^rgba?\(\s*([\d.]+%?)[\s,]+([\d.]+%?)[\s,]+([\d.]+%?)(?:\s*[,/]\s*([\d.]+%?))?\s*\)$/.exec(v);
    if (!m) { return null; }
    let a = 1;
    if (m[4] !== undefined) {
      a = m[4].endsWith('%') ? parseFloat(m[4]) / 100 : parseFloat(m[4]);
    }
    const ch = function (n) {
      const x = n.endsWith('%') ? parseFloat(n) * 255 / 100 : parseFloat(n);
      return Math.max(0, Math.min(255, Math.round(x)));
    };
    return { r: ch(m[1]), g: ch(m[2]), b: ch(m[3]), a: Math.max(0, Math.min(1, a)) };
  }

  function hex2(n) {
    return n.toString(16).padStart(2, '0');
  }

  function cssColor(value) {
    const v = String(value || '').trim();
    if (!v) { return null; }
    const c = parseColor(v);
    if (!c) { return v; }
    if (c.a <= 0) { return null; }
    if (c.a >= 1) { return '#' + hex2(c.r) + hex2(c.g) + hex2(c.b); }
    return 'rgba(' + c.r + ', ' + c.g + ', ' + c.b + ', ' + Math.round(c.a * 1000) / 1000 + ')';
  }

  function leadingNumber(value) {
    const m = /^\s*([+-]?[\d.]+)/.exec(String(value || ''));
    if (!m) { return null; }
    const n = parseFloat(m[1]);
    return isNaN(n) ? null : n;
  }

  function isZero(value) {
    return leadingNumber(value) === 0;
  }

  function norm(value) {
    return isZero(value) ? '0' : String(value).trim();
  }

  function collapseSides(values) {
    if (values.every(isZero)) { return null; }
    const v = values.map(norm);
    if (v[0] === v[1] && v[1] === v[2] && v[2] === v[3]) { return v[0]; }
    if (v[0] === v[2] && v[1] === v[3]) { return v[0] + ' ' + v[1]; }
    if (v[1] === v[3]) { return v[0] + ' ' + v[1] + ' ' + v[2]; }
    return v.join(' ');
  }

  function radii(snap) {
    const r = snap.borderRadius;
    return [r.topLeft, r.topRight, r.bottomRight, r.bottomLeft];
  }

  function collapseRadius(snap) {
    const values = radii(snap);
    if (values.every(isZero)) { return null; }
    const v = values.map(norm);
    return v[0] === v[1] && v[1] === v[2] && v[2] === v[3] ? v[0] : v.join(' ');
  }

  function borderVisible(side) {
    const style = String(side.style || '').trim();
    return style !== '' && style !== 'none' && style !== 'hidden' && !isZero(side.width);
  }

  function renderBorder(side) {
    return String(side.width).trim() + ' ' + String(side.style).trim() + ' ' + (cssColor(side.color) || 'transparent');
  }

  function collapseBorders(border) {
    const names = ['top', 'right', 'bottom', 'left'];
    const sides = names.map(function (n) { return border[n]; });
    const first = sides[0];
    const same = sides.every(function (s) {
      return s.width === first.width && s.style === first.style && s.color === first.color;
    });
    if (borderVisible(first) && same) { return [['border', renderBorder(first)]]; }
    const out = [];
    sides.forEach(function (s, i) {
      if (borderVisible(s)) { out.push(['border-' + names[i], renderBorder(s)]); }
    });
    return out;
  }

  function hasTransition(value) {
    const v = String(value || '').trim();
    if (!v || v === 'none') { return false; }
    return v.split(/[, ]/).some(function (token) {
      const m = /^([\d.]+)(ms|s)$/.exec(token);
      return !!m && parseFloat(m[1]) > 0;
    });
  }

  function isDefault(value, defaults) {
    return defaults.indexOf(String(value || '').trim()) !== -1;
  }

  // ---- style extraction ----

  function extract(snap) {
    const out = [];
    const push = function (prop, value) { out.push([prop, String(value).trim()]); };

    const display = String(snap.display || '').trim();
    if (display && display !== 'inline') { push('display', display); }
    if (!isDefault(snap.position, ['', 'static'])) { push('position', snap.position); }

    if (display === 'flex' || display === 'inline-flex') {
      if (!isDefault(snap.flexDirection, ['', 'row'])) { push('flex-direction', snap.flexDirection); }
      if (!isDefault(snap.justifyContent, ['', 'normal', 'flex-start', 'start'])) { push('justify-content', snap.justifyContent); }
      if (!isDefault(snap.alignItems, ['', 'normal', 'stretch'])) { push('align-items', snap.alignItems); }
      if (!isDefault(snap.gap, ['', 'normal']) && !isZero(snap.gap)) { push('gap', snap.gap); }
    }

    const m = snap.margin;
    const margin = collapseSides([m.top, m.right, m.bottom, m.left]);
    if (margin) { push('margin', margin); }
    const p = snap.padding;
    const padding = collapseSides([p.top, p.right, p.bottom, p.left]);
    if (padding) { push('padding', padding); }

    collapseBorders(snap.border).forEach(function (d) { push(d[0], d[1]); });
    const radius = collapseRadius(snap);
    if (radius) { push('border-radius', radius); }

    const bg = cssColor(snap.backgroundColor);
    if (bg) { push('background-color', bg); }
    const color = cssColor(snap.color);
    if (color) { push('color', color); }

    if (String(snap.fontFamily || '').trim()) { push('font-family', snap.fontFamily); }
    if (String(snap.fontSize || '').trim()) { push('font-size', snap.fontSize); }
    if (!isDefault(snap.fontWeight, ['', '400', 'normal'])) { push('font-weight', snap.fontWeight); }
    if (!isDefault(snap.lineHeight, ['', 'normal'])) { push('line-height', snap.lineHeight); }
    if (!isDefault(snap.letterSpacing, ['', 'normal']) && !isZero(snap.letterSpacing)) { push('letter-spacing', snap.letterSpacing); }
    if (!isDefault(snap.textAlign, ['', 'start'])) { push('text-align', snap.textAlign); }
    if (!isDefault(snap.textTransform, ['', 'none'])) { push('text-transform', snap.textTransform); }
    if (!isDefault(snap.textDecorationLine, ['', 'none'])) { push('text-decoration', snap.textDecorationLine); }

    if (!isDefault(snap.boxShadow, ['', 'none'])) { push('box-shadow', snap.boxShadow); }
    if (!isDefault(snap.cursor, ['', 'auto', 'default'])) { push('cursor', snap.cursor); }
    if (hasTransition(snap.transition)) { push('transition', snap.transition); }
    const opacity = leadingNumber(snap.opacity);
    if (opacity !== null && opacity < 1) { push('opacity', snap.opacity); }
    if (!isDefault(snap.overflow, ['', 'visible'])) { push('overflow', snap.overflow); }

    return out;
  }

  function renderRule(selector, declarations) {
    return selector + ' {\n' + declarations.map(function (d) {
      return '  ' + d[0] + ': ' + d[1] + ';\n';
    }).join('') + '}';
  }

  // ---- button and call-to-action heuristics ----

  function isInteractiveClass(c) {
    return c.toLowerCase().split(/[-_]/).some(function (part) {
      return INTERACTIVE_WORDS.some(function (w) { return part === w || part === w + 's'; });
    });
  }

  function styleSuggestsButton(snap) {
    const p = snap.padding;
    const px = function (v) { return leadingNumber(v) || 0; };
    if (!(px(p.top) >= 4 && px(p.bottom) >= 4 && px(p.left) >= 8 && px(p.right) >= 8)) { return false; }
    const clickable = String(snap.cursor).trim() === 'pointer' || String(snap.display).trim() !== 'inline';
    const bg = parseColor(snap.backgroundColor);
    const decorated = (bg !== null && bg.a > 0) || radii(snap).some(function (v) { return !isZero(v); });
    return clickable && decorated;
  }

  function textOf(el) {
    return String(el.textContent || '').split(/\s+/).filter(Boolean).join(' ');
  }

  function isButtonLike(el, snap) {
    const tag = tagOf(el);
    if (tag === 'button') { return true; }
    const type = String(el.getAttribute('type') || '').trim().toLowerCase();
    if (tag === 'input' && (type === 'button' || type === 'submit' || type === 'reset')) { return true; }
    if (String(el.getAttribute('role') || '').trim().toLowerCase() === 'button') { return true; }
    if (classesOf(el).some(isInteractiveClass)) { return true; }
    return styleSuggestsButton(snap);
  }

  function isCallToAction(el) {
    const text = Array.from(textOf(el)).slice(0, CTA_TEXT_WINDOW).join('');
    return CTA_TEXT.test(text) || classesOf(el).some(isInteractiveClass);
  }

  function semanticClass(el, snap) {
    if (!isButtonLike(el, snap)) { return null; }
    return isCallToAction(el) ? '.cta-button' : '.button';
  }

  function synthesize(el, snap) {
    return identity(el) || semanticClass(el, snap) || structural(el) || readablePath(el);
  }

  function rectOf(el) {
    const r = el.getBoundingClientRect();
    return { x: r.x, y: r.y, width: r.width, height: r.height };
  }

  function describe(el) {
    const snap = snapshot(el);
    const selectorMin = synthesize(el, snap);
    return {
      tag: tagOf(el),
      id: idOf(el),
      classes: classesOf(el),
      rect: rectOf(el),
      selectorMin: selectorMin,
      selectorPretty: pretty(selectorMin),
      selectorPath: readablePath(el),
      cssBlock: renderRule(selectorMin, extract(snap))
    };
  }

  // ---- session ----

  function post(type, payload) {
    const message = payload === undefined ? { type: type } : { type: type, payload: payload };
    try {
      window.parent.postMessage(message, '*');
    } catch (e) {}
  }

  function createSession() {
    let picking = false;
    let announced = false;
    let overlay = null;
    let label = null;

    function ensureOverlay() {
      if (overlay) { return; }
      overlay = document.createElement('div');
      overlay.setAttribute('data-pagepick-overlay', '');
      overlay.style.cssText = 'position:fixed;z-index:2147483646;pointer-events:none;' +
        'border:2px solid #2563eb;background:rgba(37,99,235,0.12);display:none;box-sizing:border-box;';
      label = document.createElement('div');
      label.setAttribute('data-pagepick-overlay', '');
      label.style.cssText = 'position:fixed;z-index:2147483647;pointer-events:none;display:none;' +
        'font:12px/1.4 monospace;color:#fff;background:#2563eb;padding:1px 4px;border-radius:2px;';
      (document.body || document.documentElement).appendChild(overlay);
      (document.body || document.documentElement).appendChild(label);
    }

    function hideOverlay() {
      if (overlay) { overlay.style.display = 'none'; }
      if (label) { label.style.display = 'none'; }
    }

    function showOverlay(el) {
      ensureOverlay();
      const r = el.getBoundingClientRect();
      overlay.style.left = r.left + 'px';
      overlay.style.top = r.top + 'px';
      overlay.style.width = r.width + 'px';
      overlay.style.height = r.height + 'px';
      overlay.style.display = 'block';
      label.textContent = tagOf(el);
      label.style.left = r.left + 'px';
      label.style.top = Math.max(0, r.top - 20) + 'px';
      label.style.display = 'block';
    }

    function targetOf(ev) {
      let el = document.elementFromPoint(ev.clientX, ev.clientY) || ev.target;
      if (!el || el.nodeType !== 1) { return null; }
      if (el.hasAttribute('data-pagepick-overlay')) { return null; }
      return el;
    }

    return {
      ready: function () {
        if (announced) { return; }
        announced = true;
        post('picker-ready');
      },
      toggle: function (next) {
        picking = !!next;
        if (!picking) { hideOverlay(); }
      },
      onMove: function (ev) {
        if (!picking) { return; }
        const el = targetOf(ev);
        if (!el) { return; }
        showOverlay(el);
        post('hover', { tag: tagOf(el) });
      },
      onClick: function (ev) {
        if (!picking) { return; }
        ev.preventDefault();
        ev.stopPropagation();
        if (ev.stopImmediatePropagation) { ev.stopImmediatePropagation(); }
        const el = targetOf(ev);
        if (!el) { return; }
        post('select', describe(el));
      }
    };
  }

  const session = createSession();
  window.__pagepickSession = true;

  function guarded(fn) {
    return function (ev) {
      try {
        fn(ev);
      } catch (e) {}
    };
  }

  window.addEventListener('message', guarded(function (ev) {
    if (ev.source !== window.parent) { return; }
    const data = ev.data;
    if (data && data.type === 'toggle-picker') {
      session.toggle(data.payload && data.payload.picking);
    }
  }));
  document.addEventListener('mousemove', guarded(session.onMove), true);
  document.addEventListener('click', guarded(session.onClick), true);

  if (document.readyState === 'loading') {
    document.addEventListener('DOMContentLoaded', guarded(session.ready));
  } else {
    session.ready();
  }
})();
"#;

/// The runtime wrapped in the `<script>` element the rewriter injects
pub fn script_block() -> String {
    format!("<script {}>{}</script>", RUNTIME_MARKER, INSPECTOR_SCRIPT)
}
