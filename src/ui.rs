use crate::dashboard::{display_date, export_filename, DashboardSession};
use crate::form::FormView;
use crate::models::{FoodSufficiency, LivingStatus};

enum Input {
    Text(&'static str),
    Count,
    Check,
    Living,
    Food,
}

struct Field {
    key: &'static str,
    label: &'static str,
    input: Input,
}

const fn text(key: &'static str, label: &'static str, placeholder: &'static str) -> Field {
    Field {
        key,
        label,
        input: Input::Text(placeholder),
    }
}

const fn check(key: &'static str, label: &'static str) -> Field {
    Field {
        key,
        label,
        input: Input::Check,
    }
}

const SECTIONS: &[(&str, &[Field])] = &[
    (
        "1. Household Information",
        &[
            text("name", "Name", "Full name"),
            text("contact_number", "Contact Number", "07X XXXXXXX"),
            Field {
                key: "family_members",
                label: "Number of family members",
                input: Input::Count,
            },
            check("vulnerable_elderly", "Elderly"),
            check("vulnerable_children_u5", "Children < 5"),
            check("vulnerable_pregnant_lactating", "Pregnant / Lactating"),
        ],
    ),
    (
        "2. Housing & Living Conditions",
        &[
            check("house_structurally_damaged", "House structurally damaged"),
            check("furniture_lost", "Furniture lost"),
            Field {
                key: "living_status",
                label: "Currently living in",
                input: Input::Living,
            },
            check("need_repairs", "Repairs"),
            check("need_bedding", "Bedding"),
            check("need_cooking_items", "Cooking items"),
            check("need_water", "Water"),
            check("need_sanitation", "Sanitation"),
        ],
    ),
    (
        "3. Livelihood & Income",
        &[
            text(
                "previous_job_business",
                "Previous job / business",
                "e.g., Daily wage worker, shop owner...",
            ),
            check("tools_equipment_lost", "Tools/equipment lost"),
            check("unable_to_work_currently", "Unable to work currently"),
            check("restart_tools", "Restart needs: tools"),
            check("restart_materials", "Restart needs: materials"),
            check("restart_capital", "Restart needs: capital"),
            check("restart_training", "Restart needs: training"),
        ],
    ),
    (
        "4. Food & Essential Supplies",
        &[
            Field {
                key: "enough_daily_food",
                label: "Enough daily food?",
                input: Input::Food,
            },
            check("clean_drinking_water_available", "Clean drinking water available"),
            check("need_dry_rations", "Dry rations"),
            check("need_hygiene_items", "Hygiene items"),
            check("need_medicine", "Medicine"),
            check("need_clothing", "Clothing"),
        ],
    ),
    (
        "5. Children & Schooling",
        &[
            check(
                "children_attending_school_before_flood",
                "Children attending school before flood",
            ),
            check("lost_books_uniforms_supplies", "Lost books/uniforms/school supplies"),
            check("school_transport_affected", "School transport affected"),
            text(
                "issues_returning_to_school",
                "Issues returning to school",
                "Write a short note (optional)",
            ),
        ],
    ),
    (
        "6. Health & Well-Being",
        &[
            text(
                "illnesses_after_flood",
                "Any illnesses after flood?",
                "e.g., fever, cough, skin issues...",
            ),
            check("on_regular_medication", "On regular medication"),
            check("emotional_stress_adults", "Emotional stress: adults"),
            check("emotional_stress_children", "Emotional stress: children"),
        ],
    ),
    (
        "7. Support Received So Far",
        &[
            check("support_government", "Government assistance"),
            check("support_ngo_charity", "NGO/charity support"),
            check("support_community_relatives", "Community/relatives support"),
            check("support_none", "No support received yet"),
        ],
    ),
    (
        "8. Priority Needs (Top 3)",
        &[
            text("priority_1", "Priority 1", "Most urgent need"),
            text("priority_2", "Priority 2", "Second urgent need"),
            text("priority_3", "Priority 3", "Third urgent need"),
            text("notes", "Extra notes (optional)", "Any additional notes"),
        ],
    ),
];

fn render_field(field: &Field) -> String {
    let Field { key, label, input } = field;
    match input {
        Input::Text(placeholder) => format!(
            r#"<label class="field"><span>{label}</span><input type="text" data-field="{key}" data-kind="text" placeholder="{placeholder}" /></label>"#
        ),
        Input::Count => format!(
            r#"<label class="field"><span>{label}</span><input type="number" min="0" data-field="{key}" data-kind="count" /></label>"#
        ),
        Input::Check => format!(
            r#"<label class="check"><input type="checkbox" data-field="{key}" data-kind="flag" /> {label}</label>"#
        ),
        Input::Living => {
            let pills: String = LivingStatus::ALL
                .iter()
                .map(|status| {
                    format!(
                        r#"<label class="pill"><input type="radio" name="{key}" value="{}" data-field="{key}" data-kind="choice" /> {}</label>"#,
                        status.as_str(),
                        status.label()
                    )
                })
                .collect();
            format!(r#"<div class="field"><span>{label}</span><div class="pills">{pills}</div></div>"#)
        }
        Input::Food => format!(
            r#"<label class="field"><span>{label}</span><select data-field="{key}" data-kind="choice"><option value="">Select</option><option value="{yes}">Yes</option><option value="{no}">No</option></select></label>"#,
            yes = FoodSufficiency::Yes.as_str(),
            no = FoodSufficiency::No.as_str(),
        ),
    }
}

fn render_sections() -> String {
    SECTIONS
        .iter()
        .map(|(title, fields)| {
            let body: String = fields.iter().map(render_field).collect();
            format!(r#"<section class="card"><h2>{title}</h2><div class="grid">{body}</div></section>"#)
        })
        .collect()
}

/// JSON safe to drop inside a `<script>` block.
fn script_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "null".to_string())
        .replace('<', "\\u003c")
}

pub fn render_collect(view: &FormView) -> String {
    COLLECT_HTML
        .replace("{{SHARED_CSS}}", SHARED_CSS)
        .replace("{{SECTIONS}}", &render_sections())
        .replace("{{INITIAL_VIEW}}", &script_json(view))
}

pub fn render_dashboard(session: &DashboardSession) -> String {
    let date = session.collection_date();
    DASHBOARD_HTML
        .replace("{{SHARED_CSS}}", SHARED_CSS)
        .replace("{{DATE}}", &display_date(date))
        .replace("{{EXPORT_FILENAME}}", &export_filename(date))
}

const SHARED_CSS: &str = r#"
    :root {
      --bg: #f3f7f4;
      --ink: #1f2a24;
      --muted: #5d6b63;
      --accent: #1f7a55;
      --card: #ffffff;
      --line: #dde6e0;
    }
    * { box-sizing: border-box; }
    body {
      margin: 0;
      background: linear-gradient(135deg, #ecfdf5, #f0f9ff 60%, #f5f3ff);
      color: var(--ink);
      font-family: "DM Sans", "Segoe UI", sans-serif;
    }
    main { width: min(1100px, 100%); margin: 0 auto; padding: 24px 16px 48px; display: grid; gap: 18px; }
    header { display: flex; flex-wrap: wrap; justify-content: space-between; gap: 12px; align-items: end; }
    h1 { margin: 0; font-size: 1.6rem; }
    h2 { margin: 0 0 12px; font-size: 1.05rem; }
    .subtitle { margin: 4px 0 0; color: var(--muted); }
    .card { background: var(--card); border: 1px solid var(--line); border-radius: 14px; padding: 18px; }
    .grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(220px, 1fr)); gap: 12px; }
    button, .button {
      border: 1px solid var(--line); border-radius: 10px; padding: 9px 16px; background: white;
      font: inherit; cursor: pointer; color: var(--ink); text-decoration: none;
    }
    button.primary { background: var(--accent); color: white; border-color: var(--accent); }
    button:disabled { opacity: 0.6; cursor: not-allowed; }
    .status { min-height: 1.2em; color: var(--muted); }
    .status[data-type="error"] { color: #b42318; }
    .status[data-type="ok"] { color: #1f7a55; }
    .chip { display: inline-block; border-radius: 999px; padding: 3px 10px; margin: 2px; background: #fef3c7; font-size: 0.8rem; }
"#;

const COLLECT_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Household Needs Assessment</title>
  <style>
    {{SHARED_CSS}}
    .layout { display: grid; grid-template-columns: minmax(0, 2fr) minmax(260px, 1fr); gap: 18px; align-items: start; }
    .form { display: grid; gap: 14px; }
    .field { display: grid; gap: 6px; font-size: 0.9rem; }
    .field input, .field select { padding: 8px 10px; border: 1px solid var(--line); border-radius: 8px; font: inherit; }
    .check { display: flex; gap: 8px; align-items: center; font-size: 0.9rem; }
    .pills { display: flex; flex-wrap: wrap; gap: 8px; }
    .pill { border: 1px solid var(--line); border-radius: 999px; padding: 6px 12px; }
    .side { position: sticky; top: 16px; display: grid; gap: 12px; }
    .todo li[data-done="true"] { color: var(--accent); }
    .todo li[data-done="false"] { color: var(--muted); }
    #review pre { max-height: 280px; overflow: auto; background: #f8faf9; padding: 10px; border-radius: 8px; font-size: 0.75rem; }
    @media (max-width: 800px) { .layout { grid-template-columns: 1fr; } }
  </style>
</head>
<body>
  <main>
    <header>
      <div>
        <h1>Household Needs Assessment</h1>
        <p class="subtitle">Flood relief field collection form</p>
      </div>
      <a class="button" href="/dashboard">View Today Dashboard</a>
    </header>

    <div class="layout">
      <div class="form">
        {{SECTIONS}}
        <div>
          <button class="primary" id="review-btn" type="button">Review &amp; Submit</button>
          <button id="reset-btn" type="button">Reset</button>
        </div>
      </div>

      <aside class="side">
        <section class="card">
          <h2>Completion <span id="count"></span></h2>
          <ul class="todo">
            <li data-check="has_name">Name</li>
            <li data-check="has_contact">Contact number</li>
            <li data-check="has_living">Living situation</li>
            <li data-check="has_food">Daily food answer</li>
            <li data-check="has_priority">At least one priority</li>
          </ul>
          <div id="tags"></div>
        </section>
        <section class="card" id="review" hidden>
          <h2>Review</h2>
          <p class="status" id="review-error" data-type="error"></p>
          <pre id="review-payload"></pre>
          <button class="primary" id="submit-btn" type="button">Submit</button>
          <button id="close-review" type="button">Close</button>
        </section>
        <div class="status" id="status"></div>
      </aside>
    </div>
  </main>

  <script>
    let view = {{INITIAL_VIEW}};
    const statusEl = document.getElementById('status');
    const inputs = Array.from(document.querySelectorAll('[data-field]'));
    const reviewEl = document.getElementById('review');
    const submitBtn = document.getElementById('submit-btn');

    const setStatus = (message, type) => {
      statusEl.textContent = message;
      statusEl.dataset.type = type || '';
    };

    const applyView = (next) => {
      view = next;
      const draft = view.draft;
      inputs.forEach((input) => {
        const value = draft[input.dataset.field];
        if (input.dataset.kind === 'flag') {
          input.checked = !!value;
        } else if (input.type === 'radio') {
          input.checked = value === input.value;
        } else if (input !== document.activeElement) {
          input.value = value === null || value === undefined ? '' : value;
        }
      });

      const checklist = view.checklist;
      document.getElementById('count').textContent = `${checklist.complete_count}/${checklist.total_count}`;
      document.querySelectorAll('[data-check]').forEach((item) => {
        item.dataset.done = String(!!checklist[item.dataset.check]);
      });

      const tagsEl = document.getElementById('tags');
      tagsEl.replaceChildren(...view.tags.map((tag) => {
        const chip = document.createElement('span');
        chip.className = 'chip';
        chip.textContent = tag;
        return chip;
      }));
      submitBtn.disabled = view.submitting;
    };

    const readValue = (input) => {
      switch (input.dataset.kind) {
        case 'flag': return input.checked;
        case 'count': return Math.max(0, parseInt(input.value, 10) || 0);
        case 'choice': return input.value || null;
        default: return input.value;
      }
    };

    const send = async (field, value) => {
      const res = await fetch('/api/form', {
        method: 'PATCH',
        headers: { 'content-type': 'application/json' },
        body: JSON.stringify({ field, value })
      });
      if (!res.ok) {
        throw new Error((await res.text()) || 'Update failed');
      }
      applyView(await res.json());
    };

    inputs.forEach((input) => {
      const event = input.dataset.kind === 'text' ? 'input' : 'change';
      input.addEventListener(event, () => {
        send(input.dataset.field, readValue(input)).catch((err) => setStatus(err.message, 'error'));
      });
    });

    document.getElementById('review-btn').addEventListener('click', async () => {
      const res = await fetch('/api/form/review');
      const review = await res.json();
      document.getElementById('review-error').textContent = review.blocking_error || '';
      document.getElementById('review-payload').textContent = JSON.stringify(review.payload, null, 2);
      reviewEl.hidden = false;
    });

    document.getElementById('close-review').addEventListener('click', () => {
      reviewEl.hidden = true;
    });

    submitBtn.addEventListener('click', async () => {
      submitBtn.disabled = true;
      setStatus('Saving...', 'info');
      try {
        const res = await fetch('/api/form/submit', { method: 'POST' });
        const body = await res.json();
        applyView(body.view);
        if (body.outcome === 'saved') {
          reviewEl.hidden = true;
          setStatus(body.message, 'ok');
        } else if (body.outcome !== 'busy') {
          setStatus(body.message, 'error');
        }
      } catch (err) {
        setStatus(err.message, 'error');
        submitBtn.disabled = false;
      }
    });

    document.getElementById('reset-btn').addEventListener('click', async () => {
      const res = await fetch('/api/form/reset', { method: 'POST' });
      const body = await res.json();
      applyView(body.view);
      setStatus(body.message, 'ok');
    });

    applyView(view);
  </script>
</body>
</html>
"#;

const DASHBOARD_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Flood Relief Dashboard</title>
  <style>
    {{SHARED_CSS}}
    .cards { display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); gap: 12px; }
    .stat .label { font-size: 0.8rem; color: var(--muted); }
    .stat .value { font-size: 1.6rem; font-weight: 600; }
    .charts { display: grid; grid-template-columns: repeat(auto-fit, minmax(320px, 1fr)); gap: 18px; }
    .bar { display: grid; gap: 4px; margin-bottom: 10px; font-size: 0.85rem; }
    .bar .row { display: flex; justify-content: space-between; }
    .track { height: 10px; border-radius: 999px; background: #e5e7eb; overflow: hidden; }
    .fill { height: 10px; }
    .tone-emerald { background: #059669cc; } .tone-sky { background: #0ea5e9cc; }
    .tone-violet { background: #8b5cf6cc; } .tone-teal { background: #14b8a6cc; }
    .tone-amber { background: #f59e0bcc; }
    .priority { display: flex; justify-content: space-between; border: 1px solid var(--line); border-radius: 8px; padding: 8px 12px; margin-bottom: 8px; }
    table { width: 100%; border-collapse: collapse; font-size: 0.85rem; }
    th, td { text-align: left; padding: 8px; border-bottom: 1px solid var(--line); vertical-align: top; }
    tr[data-id] { cursor: pointer; }
    #search { padding: 8px 10px; border: 1px solid var(--line); border-radius: 8px; font: inherit; width: min(320px, 100%); }
    #detail dl { display: grid; grid-template-columns: max-content 1fr; gap: 4px 12px; }
  </style>
</head>
<body>
  <main>
    <header>
      <div>
        <h1 id="title">{{DATE}} Flood Relief Dashboard</h1>
        <p class="subtitle">Live overview + entries collected today</p>
      </div>
      <div>
        <a class="button" href="/collect">New assessment</a>
        <button id="refresh-btn" type="button">Refresh</button>
      </div>
    </header>

    <div class="status" id="status"></div>
    <section class="cards" id="cards"></section>

    <section class="charts">
      <div class="card">
        <h2>Immediate Needs Breakdown</h2>
        <div id="needs"></div>
        <p class="subtitle">Shows how many households selected each immediate need.</p>
      </div>
      <div class="card">
        <h2>Top Priorities (Top 5)</h2>
        <div id="priorities"></div>
      </div>
    </section>

    <section class="card">
      <h2>Download Collected Information</h2>
      <p class="subtitle">Download all household assessments for {{DATE}} as an Excel file.</p>
      <button id="export-btn" type="button">Download Excel</button>
    </section>

    <section class="card">
      <h2>Today's Entries <span id="row-count"></span></h2>
      <input id="search" type="search" placeholder="Search name, contact, priority or token" />
      <table>
        <thead><tr><th>Token</th><th>Name</th><th>Contact</th><th>Priorities</th><th>Collected</th><th>Flags</th></tr></thead>
        <tbody id="rows"></tbody>
      </table>
    </section>

    <section class="card" id="detail" hidden>
      <h2>Household Assessment Details</h2>
      <dl id="detail-list"></dl>
      <button id="close-detail" type="button">Close</button>
    </section>
  </main>

  <script>
    const statusEl = document.getElementById('status');
    const refreshBtn = document.getElementById('refresh-btn');
    const exportBtn = document.getElementById('export-btn');
    const searchEl = document.getElementById('search');

    const setStatus = (message, type) => {
      statusEl.textContent = message;
      statusEl.dataset.type = type || '';
    };

    const el = (tag, className, text) => {
      const node = document.createElement(tag);
      if (className) node.className = className;
      if (text !== undefined) node.textContent = text;
      return node;
    };

    const renderRows = (rows, total) => {
      document.getElementById('row-count').textContent = `(${rows.length}/${total})`;
      document.getElementById('rows').replaceChildren(...rows.map((row) => {
        const tr = el('tr');
        const key = row.id || (row.token !== '-' ? row.token : '');
        if (key) tr.dataset.id = key;
        const tags = el('td');
        row.tags.forEach((tag) => tags.appendChild(el('span', 'chip', tag)));
        tr.append(
          el('td', '', row.token),
          el('td', '', row.name),
          el('td', '', row.contact_number),
          el('td', '', row.priorities.join(' / ')),
          el('td', '', row.collected_at),
          tags
        );
        return tr;
      }));
    };

    const render = (view) => {
      document.getElementById('title').textContent = view.title;
      document.getElementById('cards').replaceChildren(...view.cards.map((card) => {
        const box = el('div', 'card stat');
        box.append(el('div', 'label', card.label), el('div', 'value', String(card.value)));
        return box;
      }));

      document.getElementById('needs').replaceChildren(...view.needs.bars.map((bar) => {
        const row = el('div', 'bar');
        const head = el('div', 'row');
        head.append(el('span', '', bar.label), el('span', '', String(bar.value)));
        const track = el('div', 'track');
        const fill = el('div', `fill tone-${bar.tone}`);
        fill.style.width = `${bar.percent}%`;
        track.appendChild(fill);
        row.append(head, track);
        return row;
      }));

      const priorities = document.getElementById('priorities');
      if (view.top_priorities.length === 0) {
        priorities.replaceChildren(el('p', 'subtitle', 'No priorities recorded yet.'));
      } else {
        priorities.replaceChildren(...view.top_priorities.map((p) => {
          const row = el('div', 'priority');
          row.append(el('span', '', p.priority), el('strong', '', String(p.count)));
          return row;
        }));
      }

      renderRows(view.rows, view.total_rows);
      refreshBtn.disabled = view.loading;
      refreshBtn.textContent = view.loading ? 'Refreshing...' : 'Refresh';
      if (view.notices.length) setStatus(view.notices.join(' '), 'error');
    };

    const refresh = async () => {
      refreshBtn.disabled = true;
      refreshBtn.textContent = 'Refreshing...';
      setStatus('', '');
      const q = encodeURIComponent(searchEl.value);
      const res = await fetch(`/api/dashboard/refresh?q=${q}`, { method: 'POST' });
      if (!res.ok) throw new Error('Failed to load dashboard.');
      render(await res.json());
    };

    const search = async () => {
      const q = encodeURIComponent(searchEl.value);
      const res = await fetch(`/api/dashboard?q=${q}`);
      if (!res.ok) return;
      const view = await res.json();
      renderRows(view.rows, view.total_rows);
    };

    const showDetail = async (id) => {
      const res = await fetch(`/api/dashboard/rows/${encodeURIComponent(id)}`);
      if (!res.ok) return setStatus(await res.text(), 'error');
      const detail = await res.json();
      const pairs = [
        ['Token', detail.token], ['Name', detail.name], ['Contact', detail.contact_number],
        ['Family members', String(detail.family_members)], ['Collected at', detail.collected_at],
        ['Priorities', detail.priorities.join(' / ')], ['Notes', detail.notes || '-'],
        ...detail.indicators.map((i) => [i.label, i.value])
      ];
      document.getElementById('detail-list').replaceChildren(...pairs.flatMap(([k, v]) => [el('dt', '', k), el('dd', '', v)]));
      document.getElementById('detail').hidden = false;
    };

    const download = async () => {
      exportBtn.disabled = true;
      exportBtn.textContent = 'Preparing...';
      try {
        const res = await fetch('/dashboard/export');
        if (!res.ok) throw new Error((await res.text()) || 'Failed to download Excel file.');
        const blob = await res.blob();
        const url = window.URL.createObjectURL(blob);
        const a = document.createElement('a');
        a.href = url;
        a.download = '{{EXPORT_FILENAME}}';
        document.body.appendChild(a);
        a.click();
        a.remove();
        window.URL.revokeObjectURL(url);
      } catch (err) {
        setStatus(err.message, 'error');
      } finally {
        exportBtn.disabled = false;
        exportBtn.textContent = 'Download Excel';
      }
    };

    document.getElementById('rows').addEventListener('click', (event) => {
      const tr = event.target.closest('tr[data-id]');
      if (tr) showDetail(tr.dataset.id);
    });
    document.getElementById('close-detail').addEventListener('click', () => {
      document.getElementById('detail').hidden = true;
    });
    searchEl.addEventListener('input', () => search());
    refreshBtn.addEventListener('click', () => refresh().catch((err) => setStatus(err.message, 'error')));
    exportBtn.addEventListener('click', download);

    refresh().catch((err) => setStatus(err.message, 'error'));
  </script>
</body>
</html>
"#;
