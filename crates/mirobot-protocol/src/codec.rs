//! 行协议编解码
//!
//! - 发送方向：命令文本 + 可配置结束符 → 字节
//! - 接收方向：把任意分块的输入字节累积起来，扫描确认 token（默认 `ok`）
//!
//! 固件的确认没有固定分帧，`ok` 可能被拆在两次读取之间（`"o"` + `"k done"`），
//! 所以检测基于累积缓冲区的子串扫描，而不是按行解析。

use crate::ProtocolError;
use crate::command::Command;

/// 默认确认 token
pub const DEFAULT_ACK_TOKEN: &str = "ok";

/// 命令结束符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Terminator {
    /// 不追加任何字节（控制器默认接受的原始文本）
    #[default]
    None,
    /// `\n`
    Newline,
    /// `" \n"`（串口转发盒使用的格式）
    SpaceNewline,
}

impl Terminator {
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            Terminator::None => b"",
            Terminator::Newline => b"\n",
            Terminator::SpaceNewline => b" \n",
        }
    }
}

/// 确认 token
///
/// 非空字节串；默认 `"ok"`。
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct AckToken(String);

impl AckToken {
    pub fn new(token: impl Into<String>) -> Result<Self, ProtocolError> {
        let token = token.into();
        if token.is_empty() {
            return Err(ProtocolError::EmptyAckToken);
        }
        Ok(Self(token))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 缓冲区中是否出现该 token
    pub fn is_in(&self, buffer: &[u8]) -> bool {
        find_subslice(buffer, self.0.as_bytes()).is_some()
    }
}

impl Default for AckToken {
    fn default() -> Self {
        Self(DEFAULT_ACK_TOKEN.to_string())
    }
}

impl TryFrom<String> for AckToken {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AckToken> for String {
    fn from(token: AckToken) -> Self {
        token.0
    }
}

/// 使用默认 token（`ok`）扫描缓冲区
pub fn contains_ack(buffer: &[u8]) -> bool {
    find_subslice(buffer, DEFAULT_ACK_TOKEN.as_bytes()).is_some()
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|window| window == needle)
}

/// 编解码配置
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CodecConfig {
    pub terminator: Terminator,
    pub ack_token: AckToken,
}

/// 行协议编解码器
#[derive(Debug, Clone, Default)]
pub struct LineCodec {
    config: CodecConfig,
}

impl LineCodec {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// 编码命令：命令字节 + 结束符
    pub fn encode(&self, command: &Command) -> Vec<u8> {
        let terminator = self.config.terminator.as_bytes();
        let mut bytes = Vec::with_capacity(command.as_bytes().len() + terminator.len());
        bytes.extend_from_slice(command.as_bytes());
        bytes.extend_from_slice(terminator);
        bytes
    }

    /// 为一次发送/等待周期创建新的累积器
    pub fn accumulator(&self) -> AckAccumulator {
        AckAccumulator::new(self.config.ack_token.clone())
    }
}

/// 确认状态（单次发送/等待周期内有效）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckState {
    Awaiting,
    Acknowledged,
}

/// 确认累积器
///
/// 每次发送命令时新建，观察到 token 后即完成使命。已确认后继续 `push`
/// 不会回到 `Awaiting`。
#[derive(Debug, Clone)]
pub struct AckAccumulator {
    buffer: Vec<u8>,
    token: AckToken,
    state: AckState,
}

impl AckAccumulator {
    pub fn new(token: AckToken) -> Self {
        Self {
            buffer: Vec::new(),
            token,
            state: AckState::Awaiting,
        }
    }

    /// 追加一块输入字节并返回当前状态
    pub fn push(&mut self, chunk: &[u8]) -> AckState {
        if self.state == AckState::Acknowledged || chunk.is_empty() {
            self.buffer.extend_from_slice(chunk);
            return self.state;
        }

        // 只需从可能跨块的位置开始扫描
        let token_len = self.token.as_str().len();
        let scan_from = self.buffer.len().saturating_sub(token_len - 1);
        self.buffer.extend_from_slice(chunk);

        if self.token.is_in(&self.buffer[scan_from..]) {
            self.state = AckState::Acknowledged;
        }
        self.state
    }

    pub fn state(&self) -> AckState {
        self.state
    }

    pub fn is_acknowledged(&self) -> bool {
        self.state == AckState::Acknowledged
    }

    /// 已累积的原始字节
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// 已累积内容的文本形式（非 UTF-8 字节被替换）
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.buffer).into_owned()
    }

    /// 清空缓冲区并回到 `Awaiting`（状态轮询每收到一份报告后重新开始）
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.state = AckState::Awaiting;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode_without_terminator() {
        let codec = LineCodec::default();
        assert_eq!(codec.encode(&Command::home_arm()), b"$H".to_vec());
    }

    #[test]
    fn test_encode_with_terminator() {
        let codec = LineCodec::new(CodecConfig {
            terminator: Terminator::SpaceNewline,
            ..Default::default()
        });
        assert_eq!(codec.encode(&Command::home_slider()), b"$H7 \n".to_vec());

        let codec = LineCodec::new(CodecConfig {
            terminator: Terminator::Newline,
            ..Default::default()
        });
        assert_eq!(codec.encode(&Command::suction_blow()), b"M3S500\n".to_vec());
    }

    #[test]
    fn test_contains_ack() {
        assert!(!contains_ack(b""));
        assert!(!contains_ack(b"o"));
        assert!(!contains_ack(b"k"));
        assert!(!contains_ack(b"error: not Ok"));
        assert!(contains_ack(b"ok"));
        assert!(contains_ack(b"motion done ok\r\n"));
    }

    #[test]
    fn test_accumulator_split_token() {
        let mut acc = LineCodec::default().accumulator();
        assert_eq!(acc.state(), AckState::Awaiting);
        assert_eq!(acc.push(b"o"), AckState::Awaiting);
        assert_eq!(acc.push(b"k done"), AckState::Acknowledged);
        assert_eq!(acc.text(), "ok done");
    }

    #[test]
    fn test_accumulator_empty_chunks() {
        let mut acc = LineCodec::default().accumulator();
        assert_eq!(acc.push(b""), AckState::Awaiting);
        assert_eq!(acc.push(b"o"), AckState::Awaiting);
        assert_eq!(acc.push(b""), AckState::Awaiting);
        assert_eq!(acc.push(b"k"), AckState::Acknowledged);
    }

    #[test]
    fn test_accumulator_stays_acknowledged() {
        let mut acc = LineCodec::default().accumulator();
        acc.push(b"ok");
        assert_eq!(acc.push(b"garbage"), AckState::Acknowledged);
        assert!(acc.is_acknowledged());

        acc.clear();
        assert_eq!(acc.state(), AckState::Awaiting);
        assert!(acc.buffer().is_empty());
        assert_eq!(acc.push(b"ok"), AckState::Acknowledged);
    }

    #[test]
    fn test_custom_ack_token() {
        let token = AckToken::new("DONE").unwrap();
        let mut acc = AckAccumulator::new(token);
        assert_eq!(acc.push(b"ok"), AckState::Awaiting);
        assert_eq!(acc.push(b"DO"), AckState::Awaiting);
        assert_eq!(acc.push(b"NE\r\n"), AckState::Acknowledged);
    }

    #[test]
    fn test_empty_ack_token_rejected() {
        assert_eq!(AckToken::new("").unwrap_err(), ProtocolError::EmptyAckToken);
    }

    proptest! {
        /// 任意位置切分输入流，累积结果与一次性扫描一致
        #[test]
        fn prop_chunking_does_not_change_result(
            prefix in "[a-z ]{0,16}",
            suffix in "[a-z ]{0,16}",
            with_ack in any::<bool>(),
            cuts in proptest::collection::vec(0usize..40, 0..6),
        ) {
            let text = if with_ack {
                format!("{}ok{}", prefix, suffix)
            } else {
                format!("{}{}", prefix, suffix)
            };
            let bytes = text.as_bytes();

            let mut points: Vec<usize> = cuts.into_iter().map(|c| c.min(bytes.len())).collect();
            points.push(0);
            points.push(bytes.len());
            points.sort_unstable();

            let mut acc = LineCodec::default().accumulator();
            for pair in points.windows(2) {
                acc.push(&bytes[pair[0]..pair[1]]);
            }

            prop_assert_eq!(acc.is_acknowledged(), contains_ack(bytes));
        }
    }
}
