// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Dashboard templates

use minijinja::Environment;

use crate::Result;

pub const BASE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{% block title %}{% endblock %} - QuakeGuard</title>
    <style>
        :root {
            --bg-primary: #1a1a2e;
            --bg-secondary: #16213e;
            --bg-card: #0f3460;
            --text-primary: #e8e8e8;
            --text-secondary: #a0a0a0;
            --accent: #e94560;
            --border: #2a2a4a;
        }
        * { box-sizing: border-box; margin: 0; padding: 0; }
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: var(--bg-primary);
            color: var(--text-primary);
            line-height: 1.6;
        }
        .container { max-width: 1400px; margin: 0 auto; padding: 20px; }
        nav {
            background: var(--bg-secondary);
            padding: 15px 20px;
            display: flex;
            align-items: center;
            gap: 30px;
            border-bottom: 1px solid var(--border);
        }
        nav .logo { font-size: 1.5em; font-weight: bold; color: var(--accent); text-decoration: none; }
        nav a { color: var(--text-secondary); text-decoration: none; }
        nav a:hover { color: var(--text-primary); }
        form.query { display: flex; gap: 12px; align-items: end; margin: 20px 0; flex-wrap: wrap; }
        form.query label { display: flex; flex-direction: column; font-size: 0.85em; color: var(--text-secondary); }
        form.query input { padding: 6px; background: var(--bg-secondary); color: var(--text-primary); border: 1px solid var(--border); border-radius: 6px; }
        form.query button { padding: 8px 16px; background: var(--accent); color: white; border: 0; border-radius: 6px; }
        .card { background: var(--bg-card); border-radius: 12px; padding: 20px; margin-bottom: 20px; }
        .card h2 { margin-bottom: 15px; color: var(--accent); }
        .risk-card { border-left: 6px solid; }
        .stats-grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); gap: 20px; margin-bottom: 30px; }
        .stat-card { background: var(--bg-card); border-radius: 12px; padding: 20px; text-align: center; }
        .stat-card .number { font-size: 2.2em; font-weight: bold; color: var(--accent); }
        .stat-card .label { color: var(--text-secondary); font-size: 0.9em; }
        table { width: 100%; border-collapse: collapse; }
        th, td { padding: 10px; text-align: left; border-bottom: 1px solid var(--border); }
        th { color: var(--text-secondary); font-weight: 500; }
        tr:hover { background: rgba(255,255,255,0.05); }
        .dot { display: inline-block; border-radius: 50%; vertical-align: middle; }
        .warning { color: #ffaa00; }
        .muted { color: var(--text-secondary); }
    </style>
</head>
<body>
    <nav>
        <a href="/" class="logo">QuakeGuard</a>
        <a href="/">Dashboard</a>
        <a href="/api/events">Events JSON</a>
        <a href="/api/regions">Regions</a>
    </nav>
    <main class="container">
        {% block content %}{% endblock %}
    </main>
</body>
</html>"#;

pub const INDEX: &str = r#"{% extends "base.html" %}
{% block title %}Dashboard{% endblock %}
{% block content %}
<h1>Earthquake Risk Monitor</h1>

<form class="query" method="get" action="/">
    <label>Region<input name="region" value="{{ query.region }}" placeholder="e.g. California, Japan"></label>
    <label>Min magnitude<input name="min_magnitude" type="number" step="0.1" min="0" value="{{ query.min_magnitude }}"></label>
    <label>Hours<input name="hours" type="number" min="1" max="168" value="{{ query.hours }}"></label>
    <input type="hidden" name="refresh" value="true">
    <button type="submit">Refresh Data</button>
</form>

{% if count == 0 %}
<p class="warning">No recent earthquakes found matching your criteria. Try reducing the minimum magnitude or increasing the time range.</p>
{% else %}
<p>Found {{ count }} earthquakes in the last {{ query.hours }} hours. <span class="muted">Last updated: {{ fetched_at }} UTC</span></p>
{% endif %}

<div class="card risk-card" style="border-color: {{ tier_color }}">
    <h2>Current Risk Level: {{ tier_name }}</h2>
    <p><strong>Risk Score:</strong> {{ assessment.risk_score }}/80</p>
    <p><strong>Emergency Protocol:</strong> {{ assessment.protocol }}</p>
    <p><strong>Monitoring Required:</strong> {% if monitoring %}Yes{% else %}No{% endif %}</p>
</div>

{% if count > 0 %}
<div class="stats-grid">
    <div class="stat-card"><div class="number">{{ count }}</div><div class="label">Total Earthquakes</div></div>
    <div class="stat-card"><div class="number">{{ metrics.max_magnitude }}</div><div class="label">Max Magnitude</div></div>
    <div class="stat-card"><div class="number">{{ metrics.avg_magnitude }}</div><div class="label">Avg Magnitude</div></div>
    <div class="stat-card"><div class="number">{{ metrics.avg_depth }}</div><div class="label">Avg Depth (km)</div></div>
</div>

<div style="display: grid; grid-template-columns: 1fr 1fr; gap: 20px;">
    <div class="card">
        <h2>Risk Distribution</h2>
        <table>
            <tr><th>Tier</th><th>Count</th></tr>
            {% for tier, n in tiers %}<tr><td>{{ tier }}</td><td>{{ n }}</td></tr>{% endfor %}
        </table>
    </div>
    <div class="card">
        <h2>Activity by Hour (UTC)</h2>
        <table>
            <tr><th>Hour</th><th>Count</th></tr>
            {% for hour, n in hourly %}<tr><td>{{ hour }}:00</td><td>{{ n }}</td></tr>{% endfor %}
        </table>
    </div>
</div>

<div class="card">
    <h2>Earthquakes</h2>
    <p><a href="/api/export.csv?{{ query_string }}">Download CSV</a></p>
    <table>
        <tr><th></th><th>Time</th><th>Place</th><th>Magnitude</th><th>Depth (km)</th><th>Risk</th><th>Age</th></tr>
        {% for e in events %}
        <tr>
            <td><span class="dot" style="background: {{ e.color }}; width: {{ e.radius }}px; height: {{ e.radius }}px"></span></td>
            <td>{{ e.time }}</td>
            <td>{% if e.url %}<a href="{{ e.url }}" target="_blank">{{ e.place }}</a>{% else %}{{ e.place }}{% endif %}</td>
            <td>{{ e.magnitude }}</td>
            <td>{{ e.depth }}</td>
            <td>{{ e.risk_level }}</td>
            <td>{{ e.time_ago }}</td>
        </tr>
        {% endfor %}
    </table>
</div>
{% endif %}

<div class="card">
    <h2>Emergency Response</h2>
    <p><strong>During an earthquake:</strong> Drop, Cover, and Hold On. Stay indoors if you are inside; move to an open area if outside. Keep away from windows and heavy objects.</p>
    <p><strong>Afterwards:</strong> Check for injuries, gas leaks and electrical damage. Listen to emergency broadcasts and be prepared for aftershocks.</p>
</div>
{% endblock %}"#;

/// Build the template environment used by the dashboard
pub fn environment() -> Result<Environment<'static>> {
    let mut env = Environment::new();
    env.add_template("base.html", BASE)?;
    env.add_template("index.html", INDEX)?;
    Ok(env)
}
