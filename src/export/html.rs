//! Static HTML page
//!
//! The dataset is embedded as a JSON data block and drawn client-side with
//! Plotly. Nothing in the page depends on when it was rendered.

use crate::error::{PipelineError, Result};
use crate::export::dataset::ExportDataset;

const PLOTLY_URL: &str = "https://cdn.plot.ly/plotly-2.27.0.min.js";

const STYLE: &str = r#"
    body { font-family: system-ui, sans-serif; background: #0d1117; color: #f0f6fc; margin: 0; padding: 24px; }
    header { margin-bottom: 16px; }
    .meta { color: #8b949e; font-size: 14px; }
    .controls { display: flex; gap: 12px; flex-wrap: wrap; margin-bottom: 12px; }
    select, button { background: #161b22; color: #f0f6fc; border: 1px solid #30363d; border-radius: 6px; padding: 6px 10px; }
    .partial { color: #d29922; margin: 8px 0; }
    #chart { height: 520px; }
    table { border-collapse: collapse; width: 100%; margin-top: 16px; font-size: 14px; }
    th, td { border-bottom: 1px solid #21262d; padding: 4px 8px; text-align: right; }
    th:first-child, td:first-child { text-align: left; }
    .up { color: #3fb950; } .down { color: #f85149; }
"#;

const SCRIPT: &str = r#"
const data = JSON.parse(document.getElementById('dataset').textContent);
const colors = ['#58a6ff', '#3fb950', '#d29922', '#f85149', '#a371f7', '#39c5cf', '#db61a2', '#e3b341', '#8b949e', '#ff7b72'];
let scenarioKey = data.default_scenario;
let selected = [];

function scenario() { return data.scenarios[scenarioKey]; }

function fill(select, values, label) {
  select.innerHTML = '';
  values.forEach(v => {
    const option = document.createElement('option');
    option.value = v;
    option.textContent = label(v);
    select.appendChild(option);
  });
}

function rankOf(player) {
  const p = scenario().players[player];
  const m = p && (p.singles || p.combined);
  return m ? m.rank : null;
}

function refreshControls() {
  fill(document.getElementById('scenario'), Object.keys(data.scenarios), k => 'gamma = ' + k);
  document.getElementById('scenario').value = scenarioKey;
  const players = [''].concat(data.players);
  fill(document.getElementById('player'), players, p => p === '' ? 'Add a player...' : p + ' (#' + (rankOf(p) ?? '-') + ')');
  const s = scenario();
  document.getElementById('status').textContent = s.status === 'complete' ? '' :
    'Partial results (' + s.status.replace('_', ' ') + ')' + (s.failure ? ': ' + s.failure : '');
}

function bands(curve, color, name, dash) {
  const upper = curve.mu.map((m, i) => m + curve.sigma[i]);
  const lower = curve.mu.map((m, i) => m - curve.sigma[i]);
  return [
    {x: curve.dates, y: upper, mode: 'lines', line: {width: 0}, showlegend: false, hoverinfo: 'skip'},
    {x: curve.dates, y: lower, mode: 'lines', line: {width: 0}, fill: 'tonexty', fillcolor: color + '18', showlegend: false, hoverinfo: 'skip'},
    {x: curve.dates, y: curve.mu, mode: 'lines', line: {color: color, width: 2, dash: dash}, name: name},
  ];
}

function drawChart() {
  const traces = [];
  selected.forEach((player, i) => {
    const p = scenario().players[player];
    if (!p) return;
    const color = colors[i % colors.length];
    if (p.singles && p.singles.curve) traces.push(...bands(p.singles.curve, color, player + ' (singles)', 'solid'));
    if (p.combined && p.combined.curve) traces.push(...bands(p.combined.curve, color, player + ' (+doubles)', 'dash'));
  });
  Plotly.react('chart', traces, {
    paper_bgcolor: 'rgba(0,0,0,0)', plot_bgcolor: 'rgba(0,0,0,0)', font: {color: '#f0f6fc'},
    yaxis: {title: 'Skill (mu)', gridcolor: '#21262d'}, xaxis: {gridcolor: '#21262d'},
    legend: {orientation: 'h'}, hovermode: 'x unified',
  }, {responsive: true, displaylogo: false});
}

function drawTable() {
  const body = document.querySelector('#comparisons tbody');
  body.innerHTML = '';
  scenario().comparisons.forEach(r => {
    const row = document.createElement('tr');
    const cls = r.rank_change > 0 ? 'up' : (r.rank_change < 0 ? 'down' : '');
    [r.player, r.singles_rank, r.combined_rank, r.rank_change, r.singles_conservative.toFixed(3),
     r.combined_conservative.toFixed(3), r.delta_mu.toFixed(3), r.delta_sigma.toFixed(3)].forEach((v, i) => {
      const cell = document.createElement('td');
      cell.textContent = v;
      if (i === 3) cell.className = cls;
      row.appendChild(cell);
    });
    row.onclick = () => addPlayer(r.player);
    body.appendChild(row);
  });
}

function addPlayer(player) {
  if (!player || selected.includes(player) || selected.length >= colors.length) return;
  selected.push(player);
  drawChart();
}

document.addEventListener('DOMContentLoaded', () => {
  document.getElementById('scenario').onchange = e => { scenarioKey = e.target.value; refreshControls(); drawChart(); drawTable(); };
  document.getElementById('player').onchange = e => { addPlayer(e.target.value); e.target.value = ''; };
  document.getElementById('clear').onclick = () => { selected = []; drawChart(); };
  refreshControls();
  drawChart();
  drawTable();
});
"#;

/// Render the dataset as a self-contained page
pub fn render_html(dataset: &ExportDataset) -> Result<String> {
    let json = serde_json::to_string(dataset).map_err(|e| PipelineError::Export {
        message: format!("failed to serialize dataset: {}", e),
    })?;
    let title = escape_html(&dataset.title);

    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>{style}</style>
<script src="{plotly}"></script>
</head>
<body>
<header>
<h1>{title}</h1>
<div class="meta">{source} &middot; {matches} matches &middot; {players} players</div>
</header>
<div class="controls">
<select id="scenario"></select>
<select id="player"></select>
<button id="clear">Clear</button>
</div>
<div id="status" class="partial"></div>
<div id="chart"></div>
<table id="comparisons">
<thead><tr><th>Player</th><th>Singles rank</th><th>Combined rank</th><th>Change</th><th>Singles cons.</th><th>Combined cons.</th><th>&Delta;&mu;</th><th>&Delta;&sigma;</th></tr></thead>
<tbody></tbody>
</table>
<script id="dataset" type="application/json">{json}</script>
<script>{script}</script>
</body>
</html>
"#,
        title = title,
        style = STYLE,
        plotly = PLOTLY_URL,
        source = escape_html(&dataset.source),
        matches = dataset.match_count,
        players = dataset.player_count,
        json = escape_script_json(&json),
        script = SCRIPT,
    ))
}

/// Make serialized JSON safe inside a `<script>` element.
///
/// `<` only occurs inside JSON strings, where `\u003c` decodes to the
/// same character, so no data can close the element early.
pub fn escape_script_json(json: &str) -> String {
    json.replace('<', "\\u003c")
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
