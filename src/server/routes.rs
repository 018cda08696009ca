use std::path::Path;

use axum::extract::State;
use axum::response::Html;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use super::static_files::{assets_service, ASSETS_ROUTE};
use super::{api, AppState};

pub fn router(state: AppState, assets_dir: &Path) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/health", get(api::health))
        .route("/api/filters", get(api::filters))
        .route("/api/view", get(api::view))
        .route("/api/filter", post(api::select_filter))
        .route("/api/table/sort", post(api::sort))
        .route("/api/table/filter", post(api::text_filter))
        .route("/api/table/page", post(api::page))
        .route("/api/table/select-row", post(api::select_row))
        .route("/api/table/select-columns", post(api::select_columns))
        .route("/api/table/edit", post(api::edit_cell))
        .nest_service(ASSETS_ROUTE, assets_service(assets_dir))
        .fallback(api::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index(State(state): State<AppState>) -> Html<String> {
    Html(index_html().replace("{{logo}}", &state.logo.to_html()))
}

fn index_html() -> &'static str {
    r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width,initial-scale=1" />
  <title>Animal Shelter Dashboard</title>
  <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css" />
  <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
  <style>
    body { font-family: Arial, sans-serif; margin: 16px auto; max-width: 1400px; padding: 0 12px; }
    .center { text-align: center; }
    .logo-placeholder { display: inline-block; padding: 40px; border: 1px dashed #999; color: #666; }
    table { border-collapse: collapse; width: 100%; font-size: 0.85rem; }
    th, td { border: 1px solid #ddd; padding: 4px 6px; white-space: nowrap; }
    th { background: #f4f4f4; }
    th button { border: none; background: none; cursor: pointer; }
    td.editable { cursor: text; }
    .filter-row input { width: 100%; box-sizing: border-box; }
    .table-wrap { overflow-x: auto; }
    .pager { margin: 8px 0; }
    .panels { display: flex; gap: 16px; flex-wrap: wrap; }
    #map { width: 1000px; height: 500px; max-width: 100%; }
    #error { color: #b00; min-height: 1.2em; }
  </style>
</head>
<body>
  <a href="https://www.snhu.edu" target="_blank"><div class="center">{{logo}}</div></a>
  <h1 class="center"><b>Animal Shelter Dashboard</b></h1>
  <hr />
  <div id="filter-type"></div>
  <hr />
  <div id="error"></div>
  <div class="table-wrap"><table id="datatable"></table></div>
  <div class="pager" id="pager"></div>
  <br />
  <hr />
  <div class="panels">
    <div id="graph"></div>
    <div id="map"></div>
  </div>

  <script>
    const errorEl = document.getElementById('error');
    let view = null;
    let leafletMap = null;
    let markerLayer = null;

    function esc(text) {
      return String(text).replace(/[&<>"']/g, c => ({'&':'&amp;','<':'&lt;','>':'&gt;','"':'&quot;',"'":'&#39;'}[c]));
    }
    function cellText(value) {
      if (value === null || value === undefined) return '';
      return typeof value === 'object' ? JSON.stringify(value) : String(value);
    }

    async function post(path, body) {
      const response = await fetch(path, {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify(body),
      });
      const payload = await response.json();
      if (!response.ok) {
        errorEl.textContent = payload.message || ('HTTP ' + response.status);
        return;
      }
      errorEl.textContent = '';
      render(payload);
    }

    function renderFilters(options) {
      const el = document.getElementById('filter-type');
      el.innerHTML = options.map(o =>
        '<label><input type="radio" name="filter" value="' + esc(o.id) + '"> ' + esc(o.label) + '</label><br/>'
      ).join('');
      el.querySelectorAll('input').forEach(input => {
        input.addEventListener('change', () => post('/api/filter', { filter: input.value }));
      });
    }

    function renderTable(v) {
      const highlighted = new Set(v.style_data_conditional.map(rule => rule.if.column_id));
      const colors = {};
      v.style_data_conditional.forEach(rule => { colors[rule.if.column_id] = rule.background_color; });
      const filters = {};
      v.filters.forEach(f => { filters[f.column] = f.expression; });

      let html = '<thead><tr><th></th>';
      v.columns.forEach(column => {
        let arrow = '';
        if (v.sort && v.sort.column === column) arrow = v.sort.direction === 'asc' ? ' ▲' : ' ▼';
        html += '<th><input type="checkbox" class="col-select" data-column="' + esc(column) + '"'
          + (highlighted.has(column) ? ' checked' : '') + '> '
          + '<button class="sort" data-column="' + esc(column) + '">' + esc(column) + arrow + '</button></th>';
      });
      html += '</tr><tr class="filter-row"><th></th>';
      v.columns.forEach(column => {
        html += '<th><input class="col-filter" data-column="' + esc(column) + '" placeholder="filter data..." value="'
          + esc(filters[column] || '') + '"></th>';
      });
      html += '</tr></thead><tbody>';
      v.rows.forEach(row => {
        html += '<tr><td><input type="radio" name="row" class="row-select" data-index="' + row.index + '"'
          + (v.selected_row === row.index ? ' checked' : '') + '></td>';
        v.columns.forEach(column => {
          const style = colors[column] ? ' style="background-color:' + colors[column] + '"' : '';
          html += '<td class="editable" data-index="' + row.index + '" data-column="' + esc(column) + '"' + style + '>'
            + esc(cellText(row.record[column])) + '</td>';
        });
        html += '</tr>';
      });
      html += '</tbody>';

      const table = document.getElementById('datatable');
      table.innerHTML = html;
      table.querySelectorAll('button.sort').forEach(btn => {
        btn.addEventListener('click', () => {
          const column = btn.dataset.column;
          let body = { column: column, direction: 'asc' };
          if (v.sort && v.sort.column === column) {
            body = v.sort.direction === 'asc' ? { column: column, direction: 'desc' } : { column: null };
          }
          post('/api/table/sort', body);
        });
      });
      table.querySelectorAll('input.col-filter').forEach(input => {
        input.addEventListener('change', () =>
          post('/api/table/filter', { column: input.dataset.column, expression: input.value }));
      });
      table.querySelectorAll('input.col-select').forEach(input => {
        input.addEventListener('change', () => {
          const columns = Array.from(table.querySelectorAll('input.col-select:checked')).map(i => i.dataset.column);
          post('/api/table/select-columns', { columns: columns });
        });
      });
      table.querySelectorAll('input.row-select').forEach(input => {
        input.addEventListener('change', () => post('/api/table/select-row', { row: Number(input.dataset.index) }));
      });
      table.querySelectorAll('td.editable').forEach(td => {
        td.addEventListener('dblclick', () => {
          const next = prompt('New value for ' + td.dataset.column, td.textContent);
          if (next === null) return;
          const numeric = next.trim() !== '' && !isNaN(Number(next));
          post('/api/table/edit', {
            row: Number(td.dataset.index),
            column: td.dataset.column,
            value: numeric ? Number(next) : next,
          });
        });
      });

      const pager = document.getElementById('pager');
      const count = Math.max(v.page.count, 1);
      pager.innerHTML = '<button id="prev"' + (v.page.current === 0 ? ' disabled' : '') + '>&lt;</button> '
        + 'page ' + (v.page.current + 1) + ' / ' + count
        + ' <button id="next"' + (v.page.current + 1 >= count ? ' disabled' : '') + '>&gt;</button>'
        + ' <span>' + v.virtual_rows + ' of ' + v.total_rows + ' rows</span>';
      document.getElementById('prev').addEventListener('click', () => post('/api/table/page', { page: v.page.current - 1 }));
      document.getElementById('next').addEventListener('click', () => post('/api/table/page', { page: v.page.current + 1 }));
    }

    function renderChart(chart) {
      const el = document.getElementById('graph');
      if (!chart) { el.innerHTML = ''; return; }
      const palette = ['#636efa','#ef553b','#00cc96','#ab63fa','#ffa15a','#19d3f3','#ff6692','#b6e880','#ff97ff','#fecb52'];
      const r = 150, cx = 160, cy = 160;
      let angle = -Math.PI / 2;
      let paths = '';
      chart.slices.forEach((slice, i) => {
        const color = palette[i % palette.length];
        if (slice.fraction >= 1) {
          paths += '<circle cx="' + cx + '" cy="' + cy + '" r="' + r + '" fill="' + color + '"><title>' + esc(slice.label) + '</title></circle>';
          return;
        }
        const end = angle + slice.fraction * 2 * Math.PI;
        const large = slice.fraction > 0.5 ? 1 : 0;
        const x1 = cx + r * Math.cos(angle), y1 = cy + r * Math.sin(angle);
        const x2 = cx + r * Math.cos(end), y2 = cy + r * Math.sin(end);
        paths += '<path d="M' + cx + ',' + cy + ' L' + x1 + ',' + y1 + ' A' + r + ',' + r + ' 0 ' + large + ' 1 ' + x2 + ',' + y2 + ' Z" fill="' + color + '">'
          + '<title>' + esc(slice.label) + ': ' + slice.count + '</title></path>';
        angle = end;
      });
      const legend = chart.slices.map((slice, i) =>
        '<li><span style="color:' + palette[i % palette.length] + '">■</span> ' + esc(slice.label)
        + ' (' + (slice.fraction * 100).toFixed(1) + '%)</li>').join('');
      el.innerHTML = '<h3>' + esc(chart.title) + '</h3><svg width="320" height="320">' + paths + '</svg><ul>' + legend + '</ul>';
    }

    function renderMap(map) {
      if (typeof L === 'undefined') return;
      const el = document.getElementById('map');
      el.style.width = map.width;
      el.style.height = map.height;
      if (!leafletMap) {
        leafletMap = L.map('map');
        L.tileLayer('https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png', {
          attribution: '&copy; OpenStreetMap contributors',
        }).addTo(leafletMap);
        markerLayer = L.layerGroup().addTo(leafletMap);
      }
      leafletMap.setView(map.center, map.zoom);
      markerLayer.clearLayers();
      if (map.marker) {
        L.marker(map.marker.position)
          .bindTooltip(esc(map.marker.tooltip))
          .bindPopup('<h1>' + esc(map.marker.popup_title) + '</h1><p>' + esc(map.marker.popup) + '</p>')
          .addTo(markerLayer);
      }
    }

    function render(v) {
      view = v;
      document.querySelectorAll('#filter-type input').forEach(input => { input.checked = input.value === v.filter; });
      renderTable(v);
      renderChart(v.chart);
      renderMap(v.map);
    }

    async function start() {
      const options = await (await fetch('/api/filters')).json();
      renderFilters(options);
      render(await (await fetch('/api/view')).json());
    }
    start();
  </script>
</body>
</html>
"#
}
