use crate::state::SessionState;

/// 指令分发 (Control Handler)
///
/// 界面上的离散操作统一收敛为 `Command` 变体, 由唯一的 match 分发,
/// 新增指令时编译器强制补全处理分支。所有处理都是同步的、立即完成的,
/// 绝不阻塞事件循环。

/// 界面指令
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// 接近目标
    Zoom,
    /// 切换观察角度
    Angle,
    /// 发起打击
    Attack,
    /// 切换检测类别
    SelectClass(String),
    /// 退出操作台
    Exit,
}

/// 指令处理后的控制流走向
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// 停止调度并释放资源
    Shutdown,
}

pub struct ControlHandler;

impl ControlHandler {
    /// 处理一条指令, 返回控制流走向与可选的状态栏文字
    ///
    /// 设备指令目前只回显确认文字, 下行链路接入后在对应分支替换。
    pub fn handle(&self, cmd: Command, state: &mut SessionState) -> (Flow, Option<String>) {
        match cmd {
            Command::Zoom => (
                Flow::Continue,
                Some("指令确认: 接近目标 (设备链路未接入)".to_string()),
            ),
            Command::Angle => (
                Flow::Continue,
                Some("指令确认: 切换观察角度 (设备链路未接入)".to_string()),
            ),
            Command::Attack => (
                Flow::Continue,
                Some("指令确认: 发起打击 (设备链路未接入)".to_string()),
            ),
            Command::SelectClass(name) => {
                if state.set_selected_class(&name) {
                    log::info!("检测类别已切换: {name}");
                    (Flow::Continue, Some(format!("检测类别: {name}")))
                } else {
                    // 未知或重复的选择都按无操作处理
                    (Flow::Continue, None)
                }
            }
            Command::Exit => (Flow::Shutdown, Some("正在退出...".to_string())),
        }
    }
}
