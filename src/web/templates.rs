//! 内置页面

/// 伴生页面：输入用户 ID，拉取并显示翻译后的推文
pub const INDEX_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Tweet Translator</title>
</head>
<body>
<h1>Tweet Translator</h1>
<p>Translate tweets from users you follow</p>
<form id="fetch-form">
  <input id="user-id" type="text" placeholder="Enter your Twitter User ID">
  <button id="fetch-button" type="submit">Fetch &amp; Translate Tweets</button>
</form>
<div id="error" role="alert"></div>
<ul id="tweets"></ul>
<script>
const form = document.getElementById('fetch-form');
const button = document.getElementById('fetch-button');
const errorBox = document.getElementById('error');
const list = document.getElementById('tweets');

function render(tweets) {
  list.replaceChildren();
  for (const tweet of tweets) {
    const item = document.createElement('li');
    const author = document.createElement('strong');
    author.textContent = tweet.author_name ? `${tweet.author_name} @${tweet.author_username}` : tweet.author_id;
    const translated = document.createElement('p');
    translated.textContent = tweet.translation.translatedText;
    const original = document.createElement('details');
    const summary = document.createElement('summary');
    summary.textContent = 'Original';
    const originalText = document.createElement('p');
    originalText.textContent = tweet.translation.originalText;
    original.append(summary, originalText);
    item.append(author, translated, original);
    list.append(item);
  }
}

form.addEventListener('submit', async (event) => {
  event.preventDefault();
  const userId = document.getElementById('user-id').value.trim();
  if (!userId) {
    errorBox.textContent = 'Please enter a Twitter User ID';
    return;
  }

  button.disabled = true;
  errorBox.textContent = '';
  try {
    const response = await fetch(`/api/tweets?userId=${encodeURIComponent(userId)}&maxTweets=20`);
    const data = await response.json();
    if (data.success) {
      render(data.tweets);
    } else {
      errorBox.textContent = data.message || 'Failed to fetch tweets';
    }
  } catch (err) {
    errorBox.textContent = 'Network error occurred';
  } finally {
    button.disabled = false;
  }
});
</script>
</body>
</html>
"#;
