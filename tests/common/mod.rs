// shared fakes for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use modbot::classify::{Classifier, Image};
use modbot::store::{ConfigStore, MuteStore, WarningStore};
use modbot::types::{
    Attachment, ChannelId, CommunityId, Embed, Message, MessageId, Overwrite, RoleId, UserId,
};
use modbot::{ClassifyError, Moderator, PlatformError, Platform};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const GUILD: CommunityId = CommunityId(1);
pub const CHANNEL: ChannelId = ChannelId(10);
pub const LOGS: ChannelId = ChannelId(99);
pub const ALICE: UserId = UserId(100);
pub const BOB: UserId = UserId(200);

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Delete(ChannelId, MessageId),
    Send(ChannelId, String),
    Embed(ChannelId, Embed),
    Download(String),
    CreateRole(CommunityId, String),
    DeleteRole(CommunityId, RoleId),
    SetPosition(CommunityId, RoleId, u16),
    Overwrite(ChannelId, RoleId, Overwrite),
    AddRole(CommunityId, UserId, RoleId),
    RemoveRole(CommunityId, UserId, RoleId),
}

/// Records every call. Individual operations can be made to fail.
pub struct FakePlatform {
    calls: Mutex<Vec<Call>>,
    roles: Mutex<HashMap<(CommunityId, String), RoleId>>,
    failing: Mutex<HashSet<&'static str>>,
    above_bot: Mutex<HashSet<&'static str>>,
    failing_channels: Mutex<HashSet<ChannelId>>,
    bot_position: AtomicU64,
    next_role: AtomicU64,
    pub channels: Vec<ChannelId>,
}

impl Default for FakePlatform {
    fn default() -> Self {
        Self {
            calls: Mutex::default(),
            roles: Mutex::default(),
            failing: Mutex::default(),
            above_bot: Mutex::default(),
            failing_channels: Mutex::default(),
            bot_position: AtomicU64::new(5),
            next_role: AtomicU64::new(1000),
            channels: vec![ChannelId(10), ChannelId(11), ChannelId(12)],
        }
    }
}

impl FakePlatform {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail(&self, op: &'static str) {
        self.failing.lock().unwrap().insert(op);
    }

    pub fn heal(&self, op: &'static str) {
        self.failing.lock().unwrap().remove(op);
    }

    /// Fail `op` the way the platform reports a role above the bot.
    pub fn fail_above_bot(&self, op: &'static str) {
        self.above_bot.lock().unwrap().insert(op);
    }

    /// Removes a role behind the bot's back, like an admin would.
    pub fn remove_role_by_hand(&self, community: CommunityId, name: &str) {
        self.roles
            .lock()
            .unwrap()
            .remove(&(community, name.to_string()));
    }

    pub fn fail_channel(&self, channel: ChannelId) {
        self.failing_channels.lock().unwrap().insert(channel);
    }

    pub fn set_bot_position(&self, position: u16) {
        self.bot_position.store(position.into(), Ordering::SeqCst);
    }

    pub fn add_existing_role(&self, community: CommunityId, name: &str, role: RoleId) {
        self.roles
            .lock()
            .unwrap()
            .insert((community, name.to_string()), role);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    pub fn sent(&self, channel: ChannelId) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Send(ch, text) if ch == channel => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn embeds(&self) -> Vec<Embed> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Embed(_, e) => Some(e),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, op: &'static str) -> Result<(), PlatformError> {
        if self.above_bot.lock().unwrap().contains(op) {
            return Err(PlatformError::Hierarchy(format!("{op} above bot")));
        }
        if self.failing.lock().unwrap().contains(op) {
            return Err(PlatformError::Permission(format!("{op} denied")));
        }
        Ok(())
    }
}

#[async_trait]
impl Platform for FakePlatform {
    async fn delete_message(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> Result<(), PlatformError> {
        self.check("delete")?;
        self.record(Call::Delete(channel, message));
        Ok(())
    }

    async fn send_message(&self, channel: ChannelId, text: &str) -> Result<(), PlatformError> {
        if self.failing_channels.lock().unwrap().contains(&channel) {
            return Err(PlatformError::NotFound(format!("channel {channel}")));
        }
        self.check("send")?;
        self.record(Call::Send(channel, text.to_string()));
        Ok(())
    }

    async fn send_embed(&self, channel: ChannelId, embed: Embed) -> Result<(), PlatformError> {
        self.check("embed")?;
        self.record(Call::Embed(channel, embed));
        Ok(())
    }

    async fn download(&self, attachment: &Attachment) -> Result<Vec<u8>, PlatformError> {
        self.check("download")?;
        self.record(Call::Download(attachment.url.clone()));
        Ok(vec![0xFF, 0xD8, 0xFF])
    }

    async fn find_role(
        &self,
        community: CommunityId,
        name: &str,
    ) -> Result<Option<RoleId>, PlatformError> {
        self.check("find_role")?;
        Ok(self
            .roles
            .lock()
            .unwrap()
            .get(&(community, name.to_string()))
            .copied())
    }

    async fn create_role(
        &self,
        community: CommunityId,
        name: &str,
    ) -> Result<RoleId, PlatformError> {
        self.check("create_role")?;
        let role = RoleId(self.next_role.fetch_add(1, Ordering::SeqCst));
        self.roles
            .lock()
            .unwrap()
            .insert((community, name.to_string()), role);
        self.record(Call::CreateRole(community, name.to_string()));
        Ok(role)
    }

    async fn delete_role(&self, community: CommunityId, role: RoleId) -> Result<(), PlatformError> {
        self.check("delete_role")?;
        self.roles
            .lock()
            .unwrap()
            .retain(|(c, _), r| !(*c == community && *r == role));
        self.record(Call::DeleteRole(community, role));
        Ok(())
    }

    async fn bot_top_role_position(&self, _community: CommunityId) -> Result<u16, PlatformError> {
        Ok(self.bot_position.load(Ordering::SeqCst) as u16)
    }

    async fn set_role_position(
        &self,
        community: CommunityId,
        role: RoleId,
        position: u16,
    ) -> Result<(), PlatformError> {
        if self.failing.lock().unwrap().contains("set_position") {
            return Err(PlatformError::Hierarchy("bot role too low".into()));
        }
        self.record(Call::SetPosition(community, role, position));
        Ok(())
    }

    async fn channels(&self, _community: CommunityId) -> Result<Vec<ChannelId>, PlatformError> {
        Ok(self.channels.clone())
    }

    async fn set_channel_overwrite(
        &self,
        channel: ChannelId,
        role: RoleId,
        overwrite: &Overwrite,
    ) -> Result<(), PlatformError> {
        if self.failing_channels.lock().unwrap().contains(&channel) {
            return Err(PlatformError::Permission(format!("channel {channel}")));
        }
        self.check("overwrite")?;
        self.record(Call::Overwrite(channel, role, overwrite.clone()));
        Ok(())
    }

    async fn add_role(
        &self,
        community: CommunityId,
        user: UserId,
        role: RoleId,
        _reason: &str,
    ) -> Result<(), PlatformError> {
        self.check("add_role")?;
        let exists = self
            .roles
            .lock()
            .unwrap()
            .iter()
            .any(|((c, _), r)| *c == community && *r == role);
        if !exists {
            return Err(PlatformError::NotFound(format!("role {role}")));
        }
        self.record(Call::AddRole(community, user, role));
        Ok(())
    }

    async fn remove_role(
        &self,
        community: CommunityId,
        user: UserId,
        role: RoleId,
    ) -> Result<(), PlatformError> {
        self.check("remove_role")?;
        self.record(Call::RemoveRole(community, user, role));
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Answer {
    Safe,
    Unsafe,
    Fail,
}

impl Answer {
    fn result(self) -> Result<bool, ClassifyError> {
        match self {
            Self::Safe => Ok(true),
            Self::Unsafe => Ok(false),
            Self::Fail => Err(ClassifyError::Api {
                status: 503,
                body: "overloaded".into(),
            }),
        }
    }
}

pub struct FakeClassifier {
    text: Mutex<Answer>,
    image: Mutex<Answer>,
    pub text_calls: AtomicUsize,
    pub image_calls: AtomicUsize,
    pub last_sensitivity: Mutex<Option<f32>>,
}

impl FakeClassifier {
    pub fn new(text: Answer, image: Answer) -> Arc<Self> {
        Arc::new(Self {
            text: Mutex::new(text),
            image: Mutex::new(image),
            text_calls: AtomicUsize::new(0),
            image_calls: AtomicUsize::new(0),
            last_sensitivity: Mutex::new(None),
        })
    }

    pub fn set_text(&self, answer: Answer) {
        *self.text.lock().unwrap() = answer;
    }

    pub fn text_calls(&self) -> usize {
        self.text_calls.load(Ordering::SeqCst)
    }

    pub fn image_calls(&self) -> usize {
        self.image_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Classifier for FakeClassifier {
    async fn is_text_safe(&self, _content: &str) -> Result<bool, ClassifyError> {
        self.text_calls.fetch_add(1, Ordering::SeqCst);
        // give other handlers a chance to interleave, like a real request
        tokio::task::yield_now().await;
        let answer = *self.text.lock().unwrap();
        answer.result()
    }

    async fn is_image_safe(&self, _image: &Image, sensitivity: f32) -> Result<bool, ClassifyError> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_sensitivity.lock().unwrap() = Some(sensitivity);
        tokio::task::yield_now().await;
        let answer = *self.image.lock().unwrap();
        answer.result()
    }
}

pub struct Harness {
    pub moderator: Arc<Moderator>,
    pub platform: Arc<FakePlatform>,
    pub classifier: Arc<FakeClassifier>,
    pub config: Arc<ConfigStore>,
    pub warnings: Arc<WarningStore>,
    pub mutes: Arc<MuteStore>,
}

impl Harness {
    pub fn new(text: Answer, image: Answer) -> Self {
        let platform = FakePlatform::new();
        let classifier = FakeClassifier::new(text, image);
        let config = Arc::new(ConfigStore::in_memory());
        let warnings = Arc::new(WarningStore::in_memory());
        let mutes = Arc::new(MuteStore::in_memory());

        let moderator = Arc::new(Moderator::new(
            config.clone(),
            warnings.clone(),
            mutes.clone(),
            classifier.clone(),
            platform.clone(),
        ));

        Self {
            moderator,
            platform,
            classifier,
            config,
            warnings,
            mutes,
        }
    }
}

static NEXT_MESSAGE: AtomicU64 = AtomicU64::new(1);

pub fn text(author: UserId, content: &str) -> Message {
    Message {
        id: MessageId(NEXT_MESSAGE.fetch_add(1, Ordering::SeqCst)),
        community: GUILD,
        channel: CHANNEL,
        author,
        content: content.to_string(),
        attachments: vec![],
    }
}

pub fn attachment(name: &str, content_type: Option<&str>) -> Attachment {
    Attachment {
        url: format!("https://cdn.example/{name}"),
        filename: name.to_string(),
        content_type: content_type.map(str::to_string),
    }
}

pub fn with_attachments(author: UserId, content: &str, attachments: Vec<Attachment>) -> Message {
    Message {
        attachments,
        ..text(author, content)
    }
}
