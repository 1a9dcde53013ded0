//! ページへのタグ付けコントロールの組み込み

use crate::dom::{self, DomSurface, MARKER_CLASS};
use crate::local_storage::LocalStorage;
use comment_tagger_common::{
    build_controls, export, Persistence, Storage, StorageKey, TagSession, Variant,
};
use gloo::events::EventListener;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlTextAreaElement};

thread_local! {
    /// textarea の id ごとに登録中のリスナー
    ///
    /// ページが戻り値を捨てても同期が続くよう、リスナーは Tagger ではなくここで保持する。
    static ATTACHED: RefCell<HashMap<String, Vec<EventListener>>> = RefCell::new(HashMap::new());
}

/// ページ上のタグ付け状態への参照
///
/// 破棄（JS側の `free()`）してもリスナーは残る。外すときは `detach()` を呼ぶ。
#[wasm_bindgen]
pub struct Tagger {
    session: Rc<RefCell<TagSession>>,
    textarea_id: String,
}

impl Tagger {
    pub fn start(textarea_id: &str, variant: Variant, key: StorageKey) -> Result<Tagger, JsValue> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("documentが見つかりません"))?;
        let textarea: HtmlTextAreaElement = document
            .get_element_by_id(textarea_id)
            .ok_or_else(|| JsValue::from_str(&format!("要素が見つかりません: {}", textarea_id)))?
            .dyn_into()
            .map_err(|_| JsValue::from_str(&format!("textareaではありません: {}", textarea_id)))?;

        let schema = variant.schema();
        let hosts = dom::marked_elements(&document, MARKER_CLASS);
        let keys: Vec<String> = hosts.iter().map(Element::id).collect();

        let storage = LocalStorage::open().map(|s| Box::new(s) as Box<dyn Storage>);
        let persistence = Persistence::new(storage, key.slot(variant));
        let clock = Box::new(|| js_sys::Date::now() as i64);
        let session = Rc::new(RefCell::new(TagSession::start(
            schema,
            &keys,
            persistence,
            clock,
        )));

        let mut listeners = Vec::new();
        for (host, key) in hosts.iter().zip(&keys) {
            let specs = build_controls(schema, key);
            for control in dom::render_controls(&document, host, &specs)? {
                listeners.push(control_listener(control, session.clone(), textarea.clone()));
            }
        }

        textarea.set_value(session.borrow().buffer());
        session
            .borrow()
            .push_controls(&mut DomSurface::new(document.clone()));
        listeners.push(buffer_listener(document, textarea, session.clone()));

        // 同じ textarea で起動し直した場合は古いリスナーを外す
        ATTACHED.with(|attached| {
            attached
                .borrow_mut()
                .insert(textarea_id.to_string(), listeners)
        });

        Ok(Tagger {
            session,
            textarea_id: textarea_id.to_string(),
        })
    }
}

#[wasm_bindgen]
impl Tagger {
    /// 現在のバッファ
    pub fn buffer(&self) -> String {
        self.session.borrow().buffer().to_string()
    }

    /// イベントリスナーを外して同期を止める
    pub fn detach(&self) {
        let removed = ATTACHED.with(|attached| attached.borrow_mut().remove(&self.textarea_id));
        if removed.is_some() {
            log::info!("タグ付けを停止: {}", self.textarea_id);
        }
    }

    pub fn variant(&self) -> String {
        self.session.borrow().schema().variant.to_string()
    }

    /// 全レコードをJSONで取得
    #[wasm_bindgen(js_name = "recordsJson")]
    pub fn records_json(&self) -> Result<String, JsValue> {
        export::to_json(self.session.borrow().tags())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

/// コントロール → レコード
fn control_listener(
    control: Element,
    session: Rc<RefCell<TagSession>>,
    textarea: HtmlTextAreaElement,
) -> EventListener {
    let target = control.clone();
    EventListener::new(&target, "change", move |_| {
        let Some(value) = dom::read_element(&control) else {
            return;
        };
        let mut session = session.borrow_mut();
        if let Some(buffer) = session.on_control_changed(&control.id(), value) {
            textarea.set_value(buffer);
        }
    })
}

/// テキスト → レコード → コントロール
fn buffer_listener(
    document: Document,
    textarea: HtmlTextAreaElement,
    session: Rc<RefCell<TagSession>>,
) -> EventListener {
    let target = textarea.clone();
    EventListener::new(&target, "input", move |_| {
        let text = textarea.value();
        let mut surface = DomSurface::new(document.clone());
        session.borrow_mut().on_buffer_input(&text, &mut surface);
    })
}
