//! In-page scripts used by the structural layer.

/// Scans visible form controls, buttons and blocker signals.
///
/// Returns an observation object: `{ url, fields, buttons, blocker }`,
/// with fields in the camelCase `FormField` shape.
pub const FORM_SCAN_SCRIPT: &str = r#"
() => {
  const visible = (el) => {
    const r = el.getBoundingClientRect();
    const s = getComputedStyle(el);
    return r.width > 0 && r.height > 0 && s.visibility !== "hidden" && s.display !== "none";
  };
  const clean = (t) => (t || "").replace(/\s+/g, " ").trim();

  const labelFor = (el) => {
    if (el.labels && el.labels.length) return clean(el.labels[0].innerText);
    const aria = el.getAttribute("aria-label");
    if (aria) return clean(aria);
    const by = el.getAttribute("aria-labelledby");
    if (by) {
      const ref = document.getElementById(by.split(" ")[0]);
      if (ref) return clean(ref.innerText);
    }
    return clean(el.getAttribute("placeholder") || el.name || "");
  };

  const sectionFor = (el) => {
    const box = el.closest("fieldset, section, [role='group'], [data-automation-id$='Section']");
    if (!box) return null;
    const legend = box.querySelector("legend, h1, h2, h3, h4");
    return legend ? clean(legend.innerText) : null;
  };

  const typeOf = (el) => {
    const tag = el.tagName.toLowerCase();
    if (tag === "select") return "select";
    if (tag === "textarea") return "textarea";
    const t = (el.getAttribute("type") || "text").toLowerCase();
    return ["email", "tel", "number", "date", "password", "checkbox", "radio", "file"].includes(t)
      ? t
      : "text";
  };

  const fields = [];
  const seen = new Set();
  document.querySelectorAll("input, select, textarea").forEach((el, i) => {
    const type = typeOf(el);
    if (["hidden", "submit", "button"].includes((el.getAttribute("type") || "").toLowerCase())) return;
    if (type !== "file" && !visible(el)) return;
    const key = type === "radio" ? "radio:" + el.name : null;
    if (key && seen.has(key)) return;
    if (key) seen.add(key);

    const r = el.getBoundingClientRect();
    const options = type === "select"
      ? Array.from(el.options).map((o) => clean(o.text)).filter(Boolean)
      : type === "radio"
        ? Array.from(document.querySelectorAll("input[type=radio][name='" + el.name + "']")).map((o) => o.value)
        : [];
    let value = el.value;
    if (type === "checkbox") value = el.checked ? "true" : "";
    if (type === "radio") {
      const checked = document.querySelector("input[type=radio][name='" + el.name + "']:checked");
      value = checked ? "true" : "";
    }

    fields.push({
      id: el.id || el.name || "field-" + i,
      fieldType: type,
      label: labelFor(el),
      name: el.name || null,
      locator: {
        testId: el.getAttribute("data-testid") || el.getAttribute("data-automation-id") || undefined,
        ariaLabel: el.getAttribute("aria-label") || undefined,
        name: el.name || undefined,
        id: el.id || undefined,
      },
      options,
      bbox: { x: r.x, y: r.y, width: r.width, height: r.height },
      required: el.required || el.getAttribute("aria-required") === "true",
      currentValue: value || null,
      section: sectionFor(el),
    });
  });

  const buttons = Array.from(
    document.querySelectorAll("button, input[type=submit], [role=button]")
  )
    .filter(visible)
    .map((b) => ({
      text: clean(b.innerText || b.value || b.getAttribute("aria-label")),
      locator: {
        testId: b.getAttribute("data-testid") || b.getAttribute("data-automation-id") || undefined,
        id: b.id || undefined,
        text: clean(b.innerText || b.value) || undefined,
      },
    }))
    .filter((b) => b.text);

  let blocker = null;
  const body = clean(document.body ? document.body.innerText : "").toLowerCase();
  if (document.querySelector("iframe[src*='recaptcha'], iframe[src*='hcaptcha'], .g-recaptcha, .h-captcha")) {
    blocker = { kind: "captcha" };
  } else if (document.querySelector("input[type=password]") && fields.length <= 3) {
    blocker = { kind: "login" };
  } else if (/access denied|403 forbidden/.test(body)) {
    blocker = { kind: "accessDenied" };
  }

  return { url: location.href, fields, buttons, blocker };
}
"#;

/// Reads back the state of one control.
///
/// Takes `{ id, name, testId, radio }` and returns
/// `{ value, checked, selectedText }` or `null` when the element cannot be
/// found. With `radio` set, reads the checked option of group `name`.
pub const READ_VALUE_SCRIPT: &str = r#"
({ id, name, testId, radio }) => {
  if (radio && name) {
    const picked = document.querySelector("input[type=radio][name='" + name + "']:checked");
    return picked
      ? { value: picked.value, checked: true, selectedText: null }
      : { value: null, checked: false, selectedText: null };
  }
  let el = null;
  if (testId) el = document.querySelector("[data-testid='" + testId + "'], [data-automation-id='" + testId + "']");
  if (!el && id) el = document.getElementById(id);
  if (!el && name) {
    const all = document.getElementsByName(name);
    el = Array.from(all).find((e) => e.checked) || all[0] || null;
  }
  if (!el) return null;
  const selected = el.tagName === "SELECT" && el.selectedIndex >= 0
    ? el.options[el.selectedIndex].text.trim()
    : null;
  return { value: el.value ?? null, checked: !!el.checked, selectedText: selected };
}
"#;
