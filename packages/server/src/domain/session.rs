//! 接続ごとのプロトコル状態
//!
//! `Unregistered → Registered → Closed`。`Closed` は終端状態。

use super::{ConnectionHandle, ConnectionId, MessageText, UserId};

/// 受信イベント（ワイヤ形式からデコード済み）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Register { user_id: UserId },
    Message { recipient_id: UserId, text: MessageText },
}

/// 接続の状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Unregistered,
    Registered(UserId),
    Closed,
}

/// 1 本の接続のセッション
///
/// 自分自身のハンドルと、プロトコル上の状態を保持する。
#[derive(Debug)]
pub struct ConnectionSession {
    handle: ConnectionHandle,
    state: ConnectionState,
}

impl ConnectionSession {
    pub fn new(handle: ConnectionHandle) -> Self {
        Self {
            handle,
            state: ConnectionState::Unregistered,
        }
    }

    pub fn handle(&self) -> &ConnectionHandle {
        &self.handle
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.handle.id()
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// 登録済みならその ID
    pub fn user_id(&self) -> Option<&UserId> {
        match &self.state {
            ConnectionState::Registered(user_id) => Some(user_id),
            _ => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state == ConnectionState::Closed
    }

    /// 登録済み状態へ遷移し、直前に名乗っていた ID を返す
    ///
    /// `Closed` からは遷移しない。
    pub fn mark_registered(&mut self, user_id: UserId) -> Option<UserId> {
        match std::mem::replace(&mut self.state, ConnectionState::Registered(user_id)) {
            ConnectionState::Registered(previous) => Some(previous),
            ConnectionState::Unregistered => None,
            ConnectionState::Closed => {
                self.state = ConnectionState::Closed;
                None
            }
        }
    }

    /// 終端状態へ遷移し、登録済みだった ID を返す
    pub fn mark_closed(&mut self) -> Option<UserId> {
        match std::mem::replace(&mut self.state, ConnectionState::Closed) {
            ConnectionState::Registered(user_id) => Some(user_id),
            _ => None,
        }
    }
}
