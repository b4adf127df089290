//! Embedded script for the live chat panel.
//!
//! The page itself is rendered server-side (see [`crate::render::page`]);
//! this script only drives the question panel: submit, poll while a
//! question is in flight, and re-render the transcript from
//! `GET /api/chat` snapshots. No external assets, no build tools.

/// Inlined at the end of the served page.
pub const CHAT_SCRIPT: &str = r##"
// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------
const form = document.getElementById('chat-form');
const input = document.getElementById('chat-input');
const button = document.getElementById('chat-submit');
const log = document.getElementById('chat-log');
const thinking = document.getElementById('chat-thinking');
const errorEl = document.getElementById('chat-error');
const POLL_MS = 500;
let busy = !thinking.hidden;

// ---------------------------------------------------------------------------
// API helpers
// ---------------------------------------------------------------------------
async function api(method, path, body) {
  const opts = { method, headers: {} };
  if (body) {
    opts.headers['Content-Type'] = 'application/json';
    opts.body = JSON.stringify(body);
  }
  const res = await fetch(path, opts);
  return { status: res.status, data: await res.json() };
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------
function renderMessage(m) {
  const who = m.role === 'user' ? 'You' : 'Gemini';
  return `<div class="msg ${esc(m.role)}"><strong>${who}:</strong> ${esc(m.text)}</div>`;
}

function renderSnapshot(s) {
  const wasBusy = busy;
  busy = s.state === 'awaiting_response';

  log.innerHTML = s.messages.length === 0
    ? `<p class="hint">${esc(log.dataset.hint)}</p>`
    : s.messages.map(renderMessage).join('');
  log.scrollTop = log.scrollHeight;

  thinking.hidden = !busy;
  input.disabled = busy;
  button.textContent = busy ? 'Sending...' : 'Ask';
  if (wasBusy && !busy) {
    input.value = '';
    input.focus();
  }
  showError(s.last_error);
  updateButton();

  if (busy) setTimeout(poll, POLL_MS);
}

function showError(msg) {
  errorEl.textContent = msg || '';
  errorEl.hidden = !msg;
}

function updateButton() {
  button.disabled = busy || !input.value.trim();
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------
async function poll() {
  try {
    const { data } = await api('GET', '/api/chat');
    renderSnapshot(data);
  } catch (e) {
    showError('Lost connection to the dashboard server.');
    setTimeout(poll, POLL_MS * 4);
  }
}

form.addEventListener('submit', async (e) => {
  e.preventDefault();
  if (busy || !input.value.trim()) return;
  try {
    const { status, data } = await api('POST', '/api/chat', { question: input.value });
    if (status === 202) {
      renderSnapshot(data);
    } else {
      showError(data.error);
      if (status === 409) poll();
    }
  } catch (err) {
    showError('Failed to reach the dashboard server.');
  }
});

input.addEventListener('input', updateButton);

// ---------------------------------------------------------------------------
// Utility
// ---------------------------------------------------------------------------
function esc(s) {
  if (!s) return '';
  return s.replace(/&/g,'&amp;').replace(/</g,'&lt;').replace(/>/g,'&gt;').replace(/"/g,'&quot;');
}

// ---------------------------------------------------------------------------
// Init
// ---------------------------------------------------------------------------
poll();
"##;
