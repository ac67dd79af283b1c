// The single form page. Served as one static document; the inline script
// drives prefill and submission through the JSON API.

pub const FORM_PAGE: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Exobrain Diary</title>
<style>
  body { font-family: system-ui, sans-serif; max-width: 52rem; margin: 2rem auto; padding: 0 1rem; color: #222; }
  h1 { margin-bottom: 0.25rem; }
  .caption { color: #666; margin-top: 0; }
  label { display: block; margin: 1rem 0 0.25rem; font-weight: 600; }
  textarea { width: 100%; min-height: 16rem; font: inherit; padding: 0.5rem; box-sizing: border-box; }
  input[type="date"] { font: inherit; padding: 0.25rem; }
  button { margin-top: 1rem; font: inherit; padding: 0.5rem 1.5rem; cursor: pointer; }
  button:disabled { cursor: wait; opacity: 0.6; }
  .banner { margin-top: 1rem; padding: 0.75rem 1rem; border-radius: 4px; display: none; white-space: pre-wrap; }
  .banner.show { display: block; }
  #success { background: #e6f4e6; border: 1px solid #9c9; }
  #warning { background: #fdf6e3; border: 1px solid #dc9; }
  #error { background: #fae6e6; border: 1px solid #c99; }
  #feedback { margin-top: 1rem; padding: 1rem; background: #f0f4fa; border: 1px solid #9ab; border-radius: 4px; display: none; white-space: pre-wrap; }
  #feedback.show { display: block; }
</style>
</head>
<body>
<h1>&#129504; Exobrain Diary</h1>
<p class="caption">Your thinking and memory, with a second pair of eyes.</p>

<label for="date">Which day is this entry for?</label>
<input type="date" id="date">

<label for="text">Write your diary here...</label>
<textarea id="text" placeholder="What happened today?"></textarea>

<button id="save">Save entry</button>

<div id="success" class="banner"></div>
<div id="warning" class="banner"></div>
<div id="error" class="banner"></div>
<div id="feedback"></div>

<script>
const dateInput = document.getElementById('date');
const textInput = document.getElementById('text');
const saveButton = document.getElementById('save');
const banners = {
  success: document.getElementById('success'),
  warning: document.getElementById('warning'),
  error: document.getElementById('error'),
};
const feedbackBox = document.getElementById('feedback');

function clearBanners() {
  for (const el of Object.values(banners)) { el.classList.remove('show'); el.textContent = ''; }
  feedbackBox.classList.remove('show');
  feedbackBox.textContent = '';
}

function show(kind, message) {
  banners[kind].textContent = message;
  banners[kind].classList.add('show');
}

async function prefill() {
  clearBanners();
  try {
    const res = await fetch('/api/entry?date=' + dateInput.value);
    const entry = await res.json();
    textInput.value = entry.diary;
    if (entry.feedback) {
      feedbackBox.textContent = entry.feedback;
      feedbackBox.classList.add('show');
    }
    for (const w of entry.warnings) show('warning', w);
  } catch (err) {
    show('warning', 'Could not load the existing entry: ' + err);
  }
}

async function save() {
  clearBanners();
  if (!textInput.value.trim()) {
    show('warning', 'The diary entry is empty.');
    return;
  }

  saveButton.disabled = true;
  saveButton.textContent = 'Generating feedback...';
  try {
    const res = await fetch('/api/submit', {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify({ date: dateInput.value, text: textInput.value }),
    });
    const body = await res.json();
    if (res.ok) {
      show('success', 'Saved entry for ' + body.date + '.');
      feedbackBox.textContent = body.feedback;
      feedbackBox.classList.add('show');
      for (const w of body.warnings) show('warning', w);
    } else {
      show('error', '[' + body.subsystem + '] ' + body.error);
    }
  } catch (err) {
    show('error', 'Submission failed: ' + err);
  } finally {
    saveButton.disabled = false;
    saveButton.textContent = 'Save entry';
  }
}

dateInput.valueAsDate = new Date();
dateInput.addEventListener('change', prefill);
saveButton.addEventListener('click', save);
prefill();
</script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_carries_the_form_controls() {
        assert!(FORM_PAGE.contains(r#"input type="date""#));
        assert!(FORM_PAGE.contains("<textarea"));
        assert!(FORM_PAGE.contains("/api/entry"));
        assert!(FORM_PAGE.contains("/api/submit"));
    }

    #[test]
    fn empty_entries_are_blocked_client_side_too() {
        // The server enforces the validation gate; the page mirrors it so the
        // user gets the warning without a round trip.
        assert!(FORM_PAGE.contains("The diary entry is empty."));
    }
}
