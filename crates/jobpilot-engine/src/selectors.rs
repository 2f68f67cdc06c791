//! Page selectors and endpoints for the recruiting site.
//!
//! Kept in one place because these break together when the site ships a
//! redesign.

/// Recommended-job list container.
pub const JOB_LIST: &str = "ul.rec-job-list";

/// One candidate card in the recommendation list.
pub const JOB_CARDS: &str = "ul.rec-job-list li.job-card-box";

/// Element that becomes visible once the list has no more pages to load.
pub const PAGE_END_MARKER: &str = "div#footer";

/// Logged-in user badge in the top navigation.
pub const NAV_USER_BADGE: &str = "li.nav-figure";

/// Username label inside the user badge. Strongest logged-in signal.
pub const NAV_USER_LABEL: &str = "li.nav-figure span.label-text";

/// Sign-in affordances shown to anonymous visitors.
pub const NAV_SIGN_IN: &str = "li.nav-sign a, .btns";

/// Text that confirms the sign-in affordance really is a login prompt.
pub const SIGN_IN_TEXT: &str = "登录";

/// Switches from the SMS login form to the QR-code panel. The site has
/// shipped several variants; tried in order until one is present.
pub const LOGIN_QR_SWITCHES: &[&str] = &[
    "div.btn-sign-switch.ewm-switch",
    "div.btn-sign-switch",
    ".ewm-switch",
];

/// Link on a card's expanded panel that opens the full detail page.
pub const DETAIL_LINK: &str = "a.more-job-btn";

/// Path prefix a detail link must carry to be trusted.
pub const DETAIL_LINK_PREFIX: &str = "/job_detail/";

/// Chat-start button on the detail page.
pub const CHAT_BUTTON: &str = "a.btn-startchat, a.op-btn-chat";

/// Text the chat button shows before a conversation exists.
pub const CHAT_BUTTON_TEXT: &str = "立即沟通";

/// Message input inside the chat dialog. Either a contenteditable div or a
/// plain textarea depending on the dialog variant.
pub const CHAT_INPUT: &str =
    "div#chat-input.chat-input[contenteditable='true'], textarea.input-area";

/// Send button inside the chat dialog.
pub const CHAT_SEND: &str = "div.send-message, button[type='send'].btn-send, button.btn-send";

/// Close button of the chat dialog.
pub const CHAT_CLOSE: &str = "i.icon-close";

/// Toolbar button that opens the image picker in the chat dialog.
pub const IMAGE_SEND_BUTTON: &str = "div.btn-sendimg[aria-label='发送图片']";

/// Hidden file input backing the image picker.
pub const IMAGE_FILE_INPUT: &str = "input[type='file'][accept*='image']";

/// URL fragment of the candidate detail API response.
pub const DETAIL_API_FRAGMENT: &str = "/wapi/zpgeek/job/detail.json";

/// Site origin.
pub const SITE_ORIGIN: &str = "https://www.zhipin.com";

/// Login page.
pub const LOGIN_URL: &str = "https://www.zhipin.com/web/user/?ka=header-login";
