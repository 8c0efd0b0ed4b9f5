//! In-page scripts evaluated through `Page::evaluate`.

/// Reverse lookup of the element under a viewport point.
///
/// Takes `{ x, y }` and returns a camelCase locator descriptor, or `null`
/// when nothing is under the point.
pub const ELEMENT_AT_POINT_SCRIPT: &str = r##"
({ x, y }) => {
  const el = document.elementFromPoint(x, y);
  if (!el) return null;

  const attr = (name) => el.getAttribute(name) || undefined;
  const text = (el.innerText || el.textContent || "").trim();

  const cssPath = (node) => {
    if (node.id) return "#" + CSS.escape(node.id);
    const parts = [];
    while (node && node.nodeType === 1 && parts.length < 5) {
      let part = node.tagName.toLowerCase();
      const parent = node.parentElement;
      if (parent) {
        const same = Array.from(parent.children).filter((c) => c.tagName === node.tagName);
        if (same.length > 1) part += ":nth-of-type(" + (same.indexOf(node) + 1) + ")";
      }
      parts.unshift(part);
      if (node.id) break;
      node = parent;
    }
    return parts.join(" > ");
  };

  const xpath = (node) => {
    const parts = [];
    while (node && node.nodeType === 1) {
      let i = 1;
      for (let s = node.previousElementSibling; s; s = s.previousElementSibling) {
        if (s.tagName === node.tagName) i++;
      }
      parts.unshift(node.tagName.toLowerCase() + "[" + i + "]");
      node = node.parentElement;
    }
    return "/" + parts.join("/");
  };

  const role = attr("role");
  const label = attr("aria-label");
  return {
    testId: attr("data-testid") || attr("data-test-id") || attr("data-automation-id"),
    role: role ? { role, name: label || (text.length <= 80 ? text : undefined) } : undefined,
    ariaLabel: label,
    name: attr("name"),
    id: el.id || undefined,
    text: text && text.length <= 80 ? text : undefined,
    css: cssPath(el),
    xpath: xpath(el),
  };
}
"##;
